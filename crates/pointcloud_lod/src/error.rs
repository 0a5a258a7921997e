//! Error taxonomy for the culling/LOD core.
//!
//! Nothing here is fatal to the frame loop: a failed load or an oversized
//! node only prevents that node from becoming visible, and structural
//! problems are rejected before a tree exists.

use thiserror::Error;

/// Loader failed to fetch or decode a node's point data.
///
/// The owning node is parked as failed and the frame continues; the caller
/// may re-enable it with an explicit retry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("load failed for node {id}: {reason}")]
pub struct LoadError {
  /// Id of the node the loader was asked for.
  pub id: String,
  /// Human-readable failure cause (network, decode, malformed data).
  pub reason: String,
}

impl LoadError {
  /// Convenience constructor.
  pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      reason: reason.into(),
    }
  }
}

/// A node's point data would exceed platform GPU buffer limits.
///
/// Treated as permanent: the node stays unloadable until its data shrinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{num_points} points need {requested_bytes} buffer bytes, limit is {max_bytes}")]
pub struct CapacityError {
  /// Point count of the rejected upload.
  pub num_points: u32,
  /// Largest single-buffer byte size the upload would have required.
  pub requested_bytes: u64,
  /// Backend buffer limit in bytes.
  pub max_bytes: u64,
}

/// Malformed hierarchy detected while building the tree.
///
/// Fails fast at construction time - a silently broken hierarchy would
/// corrupt visibility state during rendering.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StructuralError {
  /// The same id appears more than once in the hierarchy. A cycle always
  /// revisits an id, so this also covers cyclic child references.
  #[error("duplicate node id {0} in hierarchy")]
  DuplicateId(String),
}
