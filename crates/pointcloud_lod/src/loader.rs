//! LodLoader - the sole ingestion boundary.
//!
//! The tree asks the loader for a node's decoded point data by id; the id
//! space and its encoding are opaque to the tree. Loaders run on worker
//! threads and must be safe to invoke concurrently for distinct ids; the
//! tree de-duplicates in-flight requests per id, so a loader never sees
//! the same id twice concurrently.

use std::fmt;
use std::sync::Arc;

use crate::bounds::BoundingSphere;
use crate::error::LoadError;
use crate::points::PointData;

/// Opaque node identifier.
///
/// Interned string so arena keys and in-flight sets clone cheaply.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Arc<str>);

impl NodeId {
  /// Create an id from any string-like value.
  pub fn new(id: impl Into<Arc<str>>) -> Self {
    Self(id.into())
  }

  /// Borrow the raw id.
  #[inline]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for NodeId {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

impl From<String> for NodeId {
  fn from(id: String) -> Self {
    Self::new(id)
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Debug for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "NodeId({})", self.0)
  }
}

/// Child reference discovered from a parent's payload.
///
/// Carries the child's bounding sphere so discovered topology is cullable
/// before the child's own load.
#[derive(Clone, Debug)]
pub struct LodChild {
  /// Child id.
  pub id: NodeId,
  /// Child bounding sphere.
  pub bounding_sphere: BoundingSphere,
}

/// Decoded, not-yet-uploaded LOD node.
#[derive(Clone, Debug)]
pub struct LodNode {
  /// Id this payload belongs to.
  pub id: NodeId,
  /// Bounding sphere of the node's geometry.
  pub bounding_sphere: BoundingSphere,
  /// Detail level, 0 = coarsest (root).
  pub detail_level: u8,
  /// Decoded point arrays.
  pub points: PointData,
  /// Ordered child references.
  pub children: Vec<LodChild>,
}

impl LodNode {
  /// Ordered child id sequence.
  pub fn child_ids(&self) -> impl Iterator<Item = &NodeId> {
    self.children.iter().map(|child| &child.id)
  }
}

/// Asynchronously fetches and decodes a LOD node's point data.
///
/// Implementations are called from worker threads; they must not touch GPU
/// state (decoded data is handed back to the frame loop for upload).
pub trait LodLoader: Send + Sync {
  /// Fetch and decode one node.
  fn load_node(&self, id: &NodeId) -> Result<LodNode, LoadError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn node_id_roundtrip_and_equality() {
    let a = NodeId::from("r01");
    let b = NodeId::new(String::from("r01"));
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "r01");
    assert_eq!(format!("{a}"), "r01");
  }

  #[test]
  fn child_ids_preserve_order() {
    let sphere = BoundingSphere::new(glam::DVec3::ZERO, 1.0);
    let node = LodNode {
      id: "r".into(),
      bounding_sphere: sphere,
      detail_level: 0,
      points: PointData::default(),
      children: vec![
        LodChild { id: "r0".into(), bounding_sphere: sphere },
        LodChild { id: "r1".into(), bounding_sphere: sphere },
      ],
    };
    let ids: Vec<_> = node.child_ids().map(NodeId::as_str).collect();
    assert_eq!(ids, ["r0", "r1"]);
  }
}
