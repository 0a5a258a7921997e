//! pointcloud_lod - engine-independent culling/LOD core for streamed
//! point cloud rendering
//!
//! Renders very large point clouds in real time by streaming only the
//! level-of-detail data currently visible: a spatial hierarchy of bounding
//! spheres decides what to load, upload to the GPU, and draw, without ever
//! stalling the frame loop.
//!
//! # Features
//!
//! - **Frustum culling**: inclusive sphere/frustum tests prune invisible
//!   subtrees before any I/O happens
//! - **Coarse-to-fine LOD selection**: injectable metric (screen-space
//!   error or distance bands) with a parent-as-placeholder policy so
//!   resolving detail never leaves gaps
//! - **Asynchronous loading**: rayon workers + channel hand-back; the
//!   frame loop polls and uploads on the GPU-owning thread
//! - **Budgeted GPU residency**: least-recently-visible eviction when
//!   resident bytes cross the configured budget
//!
//! # Example
//!
//! ```ignore
//! use pointcloud_lod::{CullingTree, LodConfig, MemoryBudget, NodeDesc};
//!
//! let desc = NodeDesc::leaf("root", root_sphere);
//! let mut tree = CullingTree::new(desc, loader, gpu, LodConfig::default(), MemoryBudget::UNLIMITED)?;
//!
//! // Each frame: cull, stream, draw.
//! for renderer in tree.select_visible(&view) {
//!     backend.draw_points(renderer);
//! }
//! ```

pub mod bounds;
pub mod config;
pub mod error;
pub mod gpu;
pub mod load_queue;
pub mod loader;
pub mod points;
pub mod tree;
pub mod view;

// Re-export commonly used items
pub use bounds::{BoundingSphere, Frustum, Plane};
pub use config::{LodConfig, LodPolicy, MemoryBudget};
pub use error::{CapacityError, LoadError, StructuralError};
pub use gpu::{BufferId, GpuBackend, NodeBuffers, RendererNode};
pub use load_queue::{LoadCompletion, LoadQueue};
pub use loader::{LodChild, LodLoader, LodNode, NodeId};
pub use points::PointData;
pub use tree::{CullingNode, CullingTree, NodeDesc, NodeState, SelectStats};
pub use view::ViewState;
