//! Memory-pressure eviction planning.
//!
//! Eviction is budget-driven, not per-frame: it runs only when resident
//! GPU bytes cross the configured budget. Victims are Resolved nodes that
//! are not in the current visible set, least-recently-visible first; a
//! node selected this frame is never evicted.

use std::collections::{HashMap, HashSet};

use crate::config::MemoryBudget;
use crate::loader::NodeId;

use super::node::CullingNode;

/// Choose nodes to release until resident bytes drop under budget.
///
/// Deterministic: candidates are ordered by last-visible frame, then
/// finest detail first, then id. Returns an empty plan when under budget.
pub(crate) fn plan_evictions(
  arena: &HashMap<NodeId, CullingNode>,
  protected: &HashSet<NodeId>,
  budget: &MemoryBudget,
  resident_bytes: usize,
) -> Vec<NodeId> {
  if !budget.is_over(resident_bytes) {
    return Vec::new();
  }

  let mut candidates: Vec<(&NodeId, &CullingNode)> = arena
    .iter()
    .filter(|(id, node)| {
      node.state.is_resolved() && node.gpu_bytes() > 0 && !protected.contains(*id)
    })
    .collect();

  candidates.sort_by(|(id_a, a), (id_b, b)| {
    a.last_visible_frame
      .cmp(&b.last_visible_frame)
      .then(b.detail_level.cmp(&a.detail_level))
      .then(id_a.as_str().cmp(id_b.as_str()))
  });

  let mut bytes = resident_bytes;
  let mut victims = Vec::new();
  for (id, node) in candidates {
    if !budget.is_over(bytes) {
      break;
    }
    bytes = bytes.saturating_sub(node.gpu_bytes());
    victims.push(id.clone());
  }
  victims
}

#[cfg(test)]
#[path = "eviction_test.rs"]
mod eviction_test;
