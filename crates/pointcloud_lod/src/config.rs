//! LOD selection policy and GPU memory budget.
//!
//! The policy is injectable so both metrics can be exercised through the
//! same traversal without changing tree code.

use crate::bounds::BoundingSphere;
use crate::view::ViewState;

/// Metric deciding whether a node's own detail suffices or the traversal
/// should descend into its children.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LodPolicy {
  /// Descend while the node's projected bounding-sphere diameter exceeds
  /// the threshold in pixels.
  ScreenSpaceError {
    /// Maximum on-screen diameter for which the node's detail suffices.
    threshold_px: f32,
  },
  /// Descend while the viewer is within `detail` radii of the node center:
  ///
  /// ```text
  /// sufficient  <=>  distance / radius >= detail
  /// ```
  DistanceBands {
    /// Band width in bounding-sphere radii.
    detail: f64,
  },
}

impl LodPolicy {
  /// True when the node's own detail is enough for the current view.
  ///
  /// A viewer inside the sphere is never satisfied with the node's own
  /// detail (the projection degenerates there).
  pub fn is_detail_sufficient(&self, sphere: &BoundingSphere, view: &ViewState) -> bool {
    let dist = sphere.distance_to(view.camera_pos);
    if dist <= sphere.radius {
      return false;
    }
    match *self {
      Self::ScreenSpaceError { threshold_px } => {
        // Screen height spans 2 * tan(fov/2) * dist world units.
        let slope = (view.fov_y * 0.5).tan();
        let projected_px = (sphere.radius / (dist * slope)) * view.viewport_height_px as f64;
        projected_px <= threshold_px as f64
      }
      Self::DistanceBands { detail } => dist >= sphere.radius * detail,
    }
  }
}

impl Default for LodPolicy {
  fn default() -> Self {
    Self::DistanceBands { detail: 6.0 }
  }
}

/// Tree-wide LOD configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LodConfig {
  /// Detail metric used by the per-frame selection.
  pub policy: LodPolicy,
}

/// GPU memory budget driving eviction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBudget {
  /// Resident byte level above which eviction runs.
  pub max_gpu_bytes: usize,
}

impl MemoryBudget {
  /// Budget that never triggers eviction.
  pub const UNLIMITED: Self = Self {
    max_gpu_bytes: usize::MAX,
  };

  /// Check whether the given resident byte count exceeds the budget.
  #[inline]
  pub fn is_over(&self, resident_bytes: usize) -> bool {
    resident_bytes > self.max_gpu_bytes
  }
}

impl Default for MemoryBudget {
  fn default() -> Self {
    Self::UNLIMITED
  }
}
