//! NodeDesc - hierarchy descriptor for tree construction.
//!
//! Describes the structure known upfront (ids and bounding spheres). The
//! descriptor owns its children by value, so cycles are unrepresentable;
//! duplicate ids are rejected before a tree exists.

use std::collections::HashMap;

use crate::bounds::BoundingSphere;
use crate::error::StructuralError;
use crate::loader::NodeId;

use super::node::CullingNode;

/// Declarative node description used to build the initial arena.
#[derive(Clone, Debug)]
pub struct NodeDesc {
  /// Node id.
  pub id: NodeId,
  /// Node bounding sphere.
  pub bounding_sphere: BoundingSphere,
  /// Child descriptors, in draw-priority order.
  pub children: Vec<NodeDesc>,
}

impl NodeDesc {
  /// Describe a node without known children (they may still be discovered
  /// from its load payload later).
  pub fn leaf(id: impl Into<NodeId>, bounding_sphere: BoundingSphere) -> Self {
    Self {
      id: id.into(),
      bounding_sphere,
      children: Vec::new(),
    }
  }

  /// Describe a node with known children.
  pub fn with_children(
    id: impl Into<NodeId>,
    bounding_sphere: BoundingSphere,
    children: Vec<NodeDesc>,
  ) -> Self {
    Self {
      id: id.into(),
      bounding_sphere,
      children,
    }
  }
}

/// Flatten a descriptor into an arena, assigning detail levels by depth.
///
/// Returns the root id and the arena, or `StructuralError` when an id
/// appears twice.
pub(crate) fn flatten(
  desc: NodeDesc,
) -> Result<(NodeId, HashMap<NodeId, CullingNode>), StructuralError> {
  let root = desc.id.clone();
  let mut arena = HashMap::new();
  let mut stack = vec![(desc, 0u8)];

  while let Some((desc, depth)) = stack.pop() {
    let NodeDesc {
      id,
      bounding_sphere,
      children,
    } = desc;

    let mut node = CullingNode::unloaded(bounding_sphere, depth);
    node.children = children.iter().map(|child| child.id.clone()).collect();

    if arena.insert(id.clone(), node).is_some() {
      return Err(StructuralError::DuplicateId(id.to_string()));
    }
    for child in children {
      stack.push((child, depth.saturating_add(1)));
    }
  }

  Ok((root, arena))
}
