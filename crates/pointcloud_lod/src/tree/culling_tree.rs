//! CullingTree - the owning hierarchy coordinating visibility, async
//! loading, and GPU buffer lifetime.
//!
//! The tree lives on the single-threaded frame loop and owns the GPU
//! backend, so uploads happen on the context-owning thread. Each
//! `select_visible` call:
//!
//! 1. Drains load completions and uploads them (Loading -> Resolved, or
//!    Failed on error). Loads are never cancelled: a completion for a node
//!    that left the view is still uploaded with `visible = false`, so a
//!    returning view pays nothing.
//! 2. Runs the pure selection pass over the arena.
//! 3. Dispatches loads for wanted Unloaded nodes (in-flight de-dup).
//! 4. Flips visibility flags: newly selected on, previously visible but
//!    unselected off (not evicted - eviction is budget-driven).
//! 5. Evicts least-recently-visible resolved nodes while over the GPU
//!    byte budget, never touching this frame's visible set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, warn};
use web_time::Instant;

use crate::config::{LodConfig, MemoryBudget};
use crate::error::StructuralError;
use crate::gpu::{GpuBackend, RendererNode};
use crate::load_queue::{LoadCompletion, LoadQueue};
use crate::loader::{LodLoader, LodNode, NodeId};
use crate::view::ViewState;

use super::desc::{flatten, NodeDesc};
use super::eviction::plan_evictions;
use super::node::{CullingNode, NodeState};
use super::select::{select, SelectInput, SelectStats};

/// Hierarchy of culling nodes with asynchronous loading and budgeted GPU
/// residency.
pub struct CullingTree<L: LodLoader + 'static, G: GpuBackend> {
  arena: HashMap<NodeId, CullingNode>,
  root: NodeId,
  gpu: G,
  queue: LoadQueue<L>,
  config: LodConfig,
  budget: MemoryBudget,
  /// Frame counter stamped onto visible nodes for eviction LRU.
  frame: u64,
  /// Visible set from the most recent `select_visible` call.
  visible: Vec<NodeId>,
  resident_bytes: usize,
  last_stats: SelectStats,
}

impl<L: LodLoader + 'static, G: GpuBackend> CullingTree<L, G> {
  /// Build a tree from the known hierarchy structure.
  ///
  /// Fails fast with `StructuralError` on duplicate ids.
  pub fn new(
    desc: NodeDesc,
    loader: Arc<L>,
    gpu: G,
    config: LodConfig,
    budget: MemoryBudget,
  ) -> Result<Self, StructuralError> {
    let (root, arena) = flatten(desc)?;
    Ok(Self {
      arena,
      root,
      gpu,
      queue: LoadQueue::new(loader),
      config,
      budget,
      frame: 0,
      visible: Vec::new(),
      resident_bytes: 0,
      last_stats: SelectStats::default(),
    })
  }

  /// Per-frame entry point. Never blocks.
  ///
  /// Returns the drawable renderer nodes for this frame in deterministic
  /// coarse-to-fine order, with no duplicates and no empty nodes.
  #[tracing::instrument(skip_all, name = "tree::select_visible")]
  pub fn select_visible(&mut self, view: &ViewState) -> Vec<&RendererNode> {
    let start = Instant::now();
    self.frame += 1;

    let completions_applied = self.apply_completions();

    let output = select(SelectInput {
      arena: &self.arena,
      root: &self.root,
      view,
      policy: &self.config.policy,
    });

    let mut loads_dispatched = 0;
    for id in &output.load_requests {
      if let Some(node) = self.arena.get_mut(id) {
        if matches!(node.state, NodeState::Unloaded) && self.queue.dispatch(id) {
          node.state = NodeState::Loading;
          loads_dispatched += 1;
        }
      }
    }

    // Deselected nodes lose the flag but stay resident.
    let selected: HashSet<NodeId> = output.visible.iter().cloned().collect();
    for id in &self.visible {
      if !selected.contains(id) {
        if let Some(renderer) = self.arena.get_mut(id).and_then(CullingNode::renderer_mut) {
          renderer.set_visible(false);
        }
      }
    }
    let frame = self.frame;
    for id in &output.visible {
      if let Some(node) = self.arena.get_mut(id) {
        node.last_visible_frame = frame;
        if let Some(renderer) = node.renderer_mut() {
          renderer.set_visible(true);
        }
      }
    }
    self.visible = output.visible;

    let evictions = self.evict_protected(&selected);

    self.last_stats = SelectStats {
      completions_applied,
      loads_dispatched,
      evictions,
      select_us: start.elapsed().as_micros() as u64,
      ..output.stats
    };

    self
      .visible
      .iter()
      .filter_map(|id| self.arena.get(id).and_then(CullingNode::renderer))
      .collect()
  }

  /// Release least-recently-visible resolved nodes until under budget.
  ///
  /// The same pass `select_visible` runs on memory pressure; exposed for
  /// callers that want to reclaim memory between frames. Nodes in the
  /// current visible set are never evicted.
  pub fn evict_to_budget(&mut self) -> usize {
    let protected: HashSet<NodeId> = self.visible.iter().cloned().collect();
    self.evict_protected(&protected)
  }

  /// Re-enable a transiently failed node for loading.
  ///
  /// Returns `false` for unknown ids, nodes that are not failed, and
  /// permanent (capacity) failures.
  pub fn retry(&mut self, id: &NodeId) -> bool {
    match self.arena.get_mut(id) {
      Some(node) => match node.state {
        NodeState::Failed { permanent: false } => {
          node.state = NodeState::Unloaded;
          true
        }
        _ => false,
      },
      None => false,
    }
  }

  /// Statistics from the most recent `select_visible` call.
  pub fn last_stats(&self) -> &SelectStats {
    &self.last_stats
  }

  /// GPU bytes currently resident across all resolved nodes.
  pub fn resident_gpu_bytes(&self) -> usize {
    self.resident_bytes
  }

  /// Root node id.
  pub fn root(&self) -> &NodeId {
    &self.root
  }

  /// Number of nodes in the hierarchy (loaded or not).
  pub fn len(&self) -> usize {
    self.arena.len()
  }

  /// True when the hierarchy has no nodes. Cannot happen for a tree built
  /// from a descriptor, which always has a root.
  pub fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  /// Look up a node by id.
  pub fn node(&self, id: &NodeId) -> Option<&CullingNode> {
    self.arena.get(id)
  }

  /// Renderer node by id, when resolved.
  pub fn renderer(&self, id: &NodeId) -> Option<&RendererNode> {
    self.arena.get(id).and_then(CullingNode::renderer)
  }

  /// Ids selected by the most recent `select_visible` call.
  pub fn visible_ids(&self) -> &[NodeId] {
    &self.visible
  }

  /// Number of loads currently in flight.
  pub fn in_flight_count(&self) -> usize {
    self.queue.in_flight_count()
  }

  /// The owned GPU backend.
  pub fn gpu(&self) -> &G {
    &self.gpu
  }

  /// Apply drained completions; returns how many were applied.
  fn apply_completions(&mut self) -> usize {
    let completions = self.queue.drain_completions();
    let applied = completions.len();
    for LoadCompletion { id, result, load_us } in completions {
      match result {
        Ok(lod) => self.resolve(&id, lod, load_us),
        Err(err) => {
          warn!(node = %id, error = %err, "load failed; node parked until retry");
          if let Some(node) = self.arena.get_mut(&id) {
            if node.state.is_loading() {
              node.state = NodeState::Failed { permanent: false };
            }
          }
        }
      }
    }
    applied
  }

  /// Upload a completed payload and transition Loading -> Resolved.
  fn resolve(&mut self, id: &NodeId, lod: LodNode, load_us: u64) {
    let Some(node) = self.arena.get(id) else {
      warn!(node = %id, "completion for unknown node dropped");
      return;
    };
    // No load may be in flight and resolved simultaneously; a completion
    // racing an eviction or a stale state is dropped here.
    if !node.state.is_loading() {
      debug!(node = %id, state = node.state.name(), "stale completion dropped");
      return;
    }
    if !lod.points.is_consistent() {
      warn!(node = %id, "inconsistent point arrays; node parked until retry");
      self.set_state(id, NodeState::Failed { permanent: false });
      return;
    }

    let parent_detail = node.detail_level;
    let known = node.children.clone();

    // Attach children discovered from the payload. A discovered id already
    // present elsewhere would give a node two parents; it is rejected to
    // keep the hierarchy a strict tree.
    let mut children = known.clone();
    let mut inserts: Vec<(NodeId, CullingNode)> = Vec::new();
    for child in &lod.children {
      if known.contains(&child.id) {
        continue;
      }
      let pending = inserts.iter().any(|(queued, _)| *queued == child.id);
      if pending || self.arena.contains_key(&child.id) {
        warn!(parent = %id, child = %child.id, "discovered child already in hierarchy; rejected");
        continue;
      }
      inserts.push((
        child.id.clone(),
        CullingNode::unloaded(child.bounding_sphere, parent_detail.saturating_add(1)),
      ));
      children.push(child.id.clone());
    }
    for (child_id, child_node) in inserts {
      self.arena.insert(child_id, child_node);
    }

    // Upload on this thread - it owns the GPU context.
    let mut renderer = RendererNode::new();
    match renderer.upload(&mut self.gpu, &lod.points) {
      Ok(()) => {
        self.resident_bytes += renderer.gpu_bytes();
        debug!(
          node = %id,
          points = renderer.num_points(),
          level = lod.detail_level,
          load_us,
          "node resolved"
        );
        self.finish_resolve(id, children, NodeState::Resolved(renderer));
      }
      Err(err) => {
        warn!(node = %id, error = %err, "upload over capacity; node permanently unloadable");
        self.finish_resolve(id, children, NodeState::Failed { permanent: true });
      }
    }
  }

  fn finish_resolve(&mut self, id: &NodeId, children: SmallVec<[NodeId; 8]>, state: NodeState) {
    if let Some(node) = self.arena.get_mut(id) {
      node.children = children;
      node.state = state;
    }
  }

  fn set_state(&mut self, id: &NodeId, state: NodeState) {
    if let Some(node) = self.arena.get_mut(id) {
      node.state = state;
    }
  }

  fn evict_protected(&mut self, protected: &HashSet<NodeId>) -> usize {
    let victims = plan_evictions(&self.arena, protected, &self.budget, self.resident_bytes);
    for id in &victims {
      if let Some(node) = self.arena.get_mut(id) {
        if let NodeState::Resolved(renderer) = &mut node.state {
          self.resident_bytes = self.resident_bytes.saturating_sub(renderer.gpu_bytes());
          renderer.release(&mut self.gpu);
        }
        // Evicted nodes revert to Unloaded but keep their bounding volume
        // and child structure for reloading without re-discovery.
        node.state = NodeState::Unloaded;
        debug!(node = %id, "evicted to reclaim GPU memory");
      }
    }
    victims.len()
  }
}

impl<L: LodLoader + 'static, G: GpuBackend> Drop for CullingTree<L, G> {
  fn drop(&mut self) {
    // GPU memory is not garbage collected; tear down every resident node.
    for node in self.arena.values_mut() {
      if let NodeState::Resolved(renderer) = &mut node.state {
        renderer.release(&mut self.gpu);
      }
    }
  }
}

#[cfg(test)]
#[path = "culling_tree_test.rs"]
mod culling_tree_test;
