//! Culling/LOD hierarchy.
//!
//! The tree pairs each node's bounding sphere with an optional GPU-resident
//! renderer node and decides, coarse-to-fine each frame, what to draw, what
//! to load, and what to release.
//!
//! # Module Structure
//!
//! - [`node`]: `CullingNode` and its `NodeState` lifecycle enum
//! - [`desc`]: `NodeDesc` hierarchy descriptor and construction validation
//! - [`select`]: pure, deterministic per-frame selection pass
//! - [`eviction`]: budget-driven eviction planning
//! - [`culling_tree`]: `CullingTree` - owning orchestration of selection,
//!   async loads, uploads, and eviction

pub mod culling_tree;
pub mod desc;
pub mod eviction;
pub mod node;
pub mod select;

// Re-exports
pub use culling_tree::CullingTree;
pub use desc::NodeDesc;
pub use node::{CullingNode, NodeState};
pub use select::SelectStats;
