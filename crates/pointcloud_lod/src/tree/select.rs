//! Per-frame visibility and LOD selection.
//!
//! Pure planning pass over an arena snapshot: deterministic pre-order DFS
//! from the root, pruning subtrees whose bounding sphere misses the
//! frustum, choosing coarse-to-fine which nodes to draw and which loads to
//! request. The tree applies the output; nothing here mutates state or
//! blocks.
//!
//! # Selection rules
//!
//! 1. A node whose sphere misses the frustum is pruned with its whole
//!    subtree - no loads are triggered below it.
//! 2. An intersecting node whose own detail suffices (or that has no
//!    children) is selected: a load request when Unloaded, a visible entry
//!    when Resolved and non-empty. No descent past a selected node.
//! 3. Otherwise the walk descends into the children; a Resolved parent
//!    stays visible as a placeholder while any in-frustum child is not yet
//!    Resolved, so coarser data covers the gap until detail arrives.

use std::collections::HashMap;

use crate::config::LodPolicy;
use crate::loader::NodeId;
use crate::view::ViewState;

use super::node::{CullingNode, NodeState};

/// Inputs for one selection pass.
pub struct SelectInput<'a> {
  /// Node arena snapshot.
  pub arena: &'a HashMap<NodeId, CullingNode>,
  /// Root node id.
  pub root: &'a NodeId,
  /// Current view.
  pub view: &'a ViewState,
  /// Detail metric.
  pub policy: &'a LodPolicy,
}

/// Output of one selection pass.
pub struct SelectOutput {
  /// Nodes to draw this frame, pre-order, no duplicates, no empty nodes.
  pub visible: Vec<NodeId>,
  /// Unloaded nodes wanted this frame, in traversal order.
  pub load_requests: Vec<NodeId>,
  /// Traversal statistics.
  pub stats: SelectStats,
}

/// Statistics from one `select_visible` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectStats {
  /// Nodes whose bounding sphere was tested.
  pub nodes_tested: usize,
  /// Subtrees pruned by the frustum test.
  pub nodes_pruned: usize,
  /// Entries in the visible set.
  pub selected: usize,
  /// Resolved parents kept visible while children load.
  pub placeholders: usize,
  /// Load dispatches fired this frame.
  pub loads_dispatched: usize,
  /// Load completions applied at frame start.
  pub completions_applied: usize,
  /// Nodes evicted for memory pressure this frame.
  pub evictions: usize,
  /// Wall time of the whole call in microseconds.
  pub select_us: u64,
}

/// Run one deterministic selection pass.
#[tracing::instrument(skip_all, name = "tree::select")]
pub fn select(input: SelectInput<'_>) -> SelectOutput {
  let mut walker = Walker {
    arena: input.arena,
    view: input.view,
    policy: input.policy,
    visible: Vec::new(),
    load_requests: Vec::new(),
    stats: SelectStats::default(),
  };
  walker.visit(input.root);

  let mut stats = walker.stats;
  stats.selected = walker.visible.len();
  SelectOutput {
    visible: walker.visible,
    load_requests: walker.load_requests,
    stats,
  }
}

struct Walker<'a> {
  arena: &'a HashMap<NodeId, CullingNode>,
  view: &'a ViewState,
  policy: &'a LodPolicy,
  visible: Vec<NodeId>,
  load_requests: Vec<NodeId>,
  stats: SelectStats,
}

impl Walker<'_> {
  fn visit(&mut self, id: &NodeId) {
    let Some(node) = self.arena.get(id) else {
      return;
    };
    self.stats.nodes_tested += 1;

    if !node.bounding_sphere.intersects_frustum(&self.view.frustum) {
      self.stats.nodes_pruned += 1;
      return;
    }

    let sufficient = self
      .policy
      .is_detail_sufficient(&node.bounding_sphere, self.view);
    if sufficient || node.children.is_empty() {
      self.select_node(id, node);
      return;
    }

    // Parent-as-placeholder: keep coarser data on screen while finer
    // children are still in flight or unloaded.
    if self.drawable(node) && !self.children_cover(node) {
      self.visible.push(id.clone());
      self.stats.placeholders += 1;
    }
    for child in &node.children {
      self.visit(child);
    }
  }

  fn select_node(&mut self, id: &NodeId, node: &CullingNode) {
    match &node.state {
      NodeState::Unloaded => self.load_requests.push(id.clone()),
      NodeState::Resolved(renderer) if !renderer.is_empty() => {
        self.visible.push(id.clone());
      }
      // Loading: request already in flight, nothing to draw yet.
      // Failed: parked until an explicit retry.
      // Resolved empty: skipped at draw time.
      _ => {}
    }
  }

  /// True when every in-frustum child is resolved, i.e. the finer level
  /// fully covers this node's visible region.
  fn children_cover(&self, node: &CullingNode) -> bool {
    node.children.iter().all(|child_id| {
      match self.arena.get(child_id) {
        Some(child) => {
          !child.bounding_sphere.intersects_frustum(&self.view.frustum)
            || child.state.is_resolved()
        }
        None => true,
      }
    })
  }

  fn drawable(&self, node: &CullingNode) -> bool {
    node.renderer().is_some_and(|renderer| !renderer.is_empty())
  }
}

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;
