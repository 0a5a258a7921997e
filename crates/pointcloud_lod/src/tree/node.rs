//! CullingNode - arena-held tree node pairing a bounding volume with an
//! optional renderer node.
//!
//! Behavior differs only by state, so the lifecycle is a tagged enum
//! rather than a type hierarchy: Unloaded -> Loading -> Resolved, with
//! eviction returning a node to Unloaded and failures parked in Failed
//! until an explicit retry.

use smallvec::SmallVec;

use crate::bounds::BoundingSphere;
use crate::gpu::RendererNode;
use crate::loader::NodeId;

/// Lifecycle state of a culling node.
#[derive(Debug, Default)]
pub enum NodeState {
  /// Structural placeholder only; no in-flight request.
  #[default]
  Unloaded,
  /// A load has been dispatched and has not completed yet.
  Loading,
  /// Point data uploaded; eligible for drawing when marked visible.
  Resolved(RendererNode),
  /// Load or upload failed. Transient failures can be retried; permanent
  /// ones (capacity) stay parked until the data shrinks.
  Failed {
    /// True for capacity failures that retrying cannot fix.
    permanent: bool,
  },
}

impl NodeState {
  /// True when point data is uploaded.
  #[inline]
  pub fn is_resolved(&self) -> bool {
    matches!(self, Self::Resolved(_))
  }

  /// True while a load is in flight.
  #[inline]
  pub fn is_loading(&self) -> bool {
    matches!(self, Self::Loading)
  }

  /// Short state name for logging.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Unloaded => "unloaded",
      Self::Loading => "loading",
      Self::Resolved(_) => "resolved",
      Self::Failed { .. } => "failed",
    }
  }
}

/// One node of the culling hierarchy.
///
/// Owned by the tree's arena; children are referenced by id only, so the
/// structure stays strictly top-down and acyclic.
#[derive(Debug)]
pub struct CullingNode {
  /// Immutable bounding volume.
  pub bounding_sphere: BoundingSphere,
  /// Depth in the hierarchy, 0 = root (coarsest).
  pub detail_level: u8,
  /// Lifecycle state, including the renderer node when resolved.
  pub state: NodeState,
  /// Ordered child ids.
  pub children: SmallVec<[NodeId; 8]>,
  /// Frame number this node was last in the visible set (eviction LRU).
  pub last_visible_frame: u64,
}

impl CullingNode {
  /// Create an unloaded structural node.
  pub fn unloaded(bounding_sphere: BoundingSphere, detail_level: u8) -> Self {
    Self {
      bounding_sphere,
      detail_level,
      state: NodeState::Unloaded,
      children: SmallVec::new(),
      last_visible_frame: 0,
    }
  }

  /// Renderer node, when resolved.
  pub fn renderer(&self) -> Option<&RendererNode> {
    match &self.state {
      NodeState::Resolved(renderer) => Some(renderer),
      _ => None,
    }
  }

  /// Mutable renderer node, when resolved.
  pub fn renderer_mut(&mut self) -> Option<&mut RendererNode> {
    match &mut self.state {
      NodeState::Resolved(renderer) => Some(renderer),
      _ => None,
    }
  }

  /// GPU bytes this node holds resident.
  pub fn gpu_bytes(&self) -> usize {
    self.renderer().map_or(0, RendererNode::gpu_bytes)
  }
}
