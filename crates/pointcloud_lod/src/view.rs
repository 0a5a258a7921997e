//! Per-frame view input.

use glam::{DMat4, DVec3};

use crate::bounds::Frustum;

/// Read-only view snapshot passed into `select_visible` each frame.
#[derive(Clone, Copy, Debug)]
pub struct ViewState {
  /// Camera position in world space.
  pub camera_pos: DVec3,
  /// View frustum for culling.
  pub frustum: Frustum,
  /// Viewport height in pixels (screen-space error metric).
  pub viewport_height_px: f32,
  /// Vertical field of view in radians.
  pub fov_y: f64,
}

impl ViewState {
  /// Build a view state from a combined view-projection matrix plus the
  /// camera parameters the LOD metric needs.
  pub fn from_view_projection(
    view_proj: &DMat4,
    camera_pos: DVec3,
    viewport_height_px: f32,
    fov_y: f64,
  ) -> Self {
    Self {
      camera_pos,
      frustum: Frustum::from_view_projection(view_proj),
      viewport_height_px,
      fov_y,
    }
  }
}
