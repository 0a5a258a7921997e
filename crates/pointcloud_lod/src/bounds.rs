//! Bounding volumes and frustum tests with double precision.
//!
//! All tests are pure and deterministic. Boundary contact counts as
//! intersection everywhere, so geometry touching a frustum plane never
//! pops at screen edges.

use glam::{DMat4, DVec3};

/// Sphere guaranteed to contain all geometry of a node.
///
/// Immutable once a node is created; only used for containment and
/// distance tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
  /// Sphere center in world space.
  pub center: DVec3,
  /// Sphere radius, >= 0.
  pub radius: f64,
}

impl BoundingSphere {
  /// Create a new bounding sphere.
  ///
  /// # Panics
  /// Debug-asserts that the radius is non-negative.
  pub fn new(center: DVec3, radius: f64) -> Self {
    debug_assert!(radius >= 0.0, "bounding sphere radius must be >= 0");
    Self { center, radius }
  }

  /// Distance from a point to the sphere center.
  #[inline]
  pub fn distance_to(&self, point: DVec3) -> f64 {
    self.center.distance(point)
  }

  /// Inclusive sphere/frustum test.
  ///
  /// Returns `true` when the sphere is inside or exactly touches the
  /// frustum boundary.
  #[inline]
  pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
    frustum
      .planes
      .iter()
      .all(|plane| plane.signed_distance(self.center) >= -self.radius)
  }
}

/// Plane in normal-offset form: `normal . p + d = 0`, normal unit length,
/// pointing toward the inside half-space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  /// Unit normal of the plane.
  pub normal: DVec3,
  /// Signed offset along the normal.
  pub d: f64,
}

impl Plane {
  /// Build a plane from the raw `(a, b, c, d)` clip-row coefficients,
  /// normalizing so signed distances are in world units.
  pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64) -> Self {
    let normal = DVec3::new(a, b, c);
    let len = normal.length();
    Self {
      normal: normal / len,
      d: d / len,
    }
  }

  /// Signed distance from a point to the plane; positive on the inside.
  #[inline]
  pub fn signed_distance(&self, point: DVec3) -> f64 {
    self.normal.dot(point) + self.d
  }
}

/// View frustum as six inward-facing planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  /// Left, right, bottom, top, near, far.
  pub planes: [Plane; 6],
}

impl Frustum {
  /// Build directly from six inward-facing planes.
  pub fn new(planes: [Plane; 6]) -> Self {
    Self { planes }
  }

  /// Extract the six clip planes from a combined view-projection matrix
  /// (Gribb-Hartmann). Expects a GL-style clip space (z in [-w, w]).
  pub fn from_view_projection(view_proj: &DMat4) -> Self {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let left = r3 + r0;
    let right = r3 - r0;
    let bottom = r3 + r1;
    let top = r3 - r1;
    let near = r3 + r2;
    let far = r3 - r2;

    Self {
      planes: [left, right, bottom, top, near, far]
        .map(|row| Plane::from_coefficients(row.x, row.y, row.z, row.w)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn look_down_neg_z(eye: DVec3) -> Frustum {
    let proj = DMat4::perspective_rh_gl(std::f64::consts::FRAC_PI_2, 1.0, 0.1, 10_000.0);
    let view = DMat4::look_at_rh(eye, eye + DVec3::NEG_Z, DVec3::Y);
    Frustum::from_view_projection(&(proj * view))
  }

  #[test]
  fn sphere_in_front_of_camera_intersects() {
    let frustum = look_down_neg_z(DVec3::new(0.0, 0.0, 1000.0));
    let sphere = BoundingSphere::new(DVec3::ZERO, 100.0);
    assert!(sphere.intersects_frustum(&frustum));
  }

  #[test]
  fn sphere_behind_camera_is_excluded() {
    // Camera at z=1000 looking further toward +Z: origin is behind it.
    let proj = DMat4::perspective_rh_gl(std::f64::consts::FRAC_PI_2, 1.0, 0.1, 10_000.0);
    let view = DMat4::look_at_rh(
      DVec3::new(0.0, 0.0, 1000.0),
      DVec3::new(0.0, 0.0, 2000.0),
      DVec3::Y,
    );
    let frustum = Frustum::from_view_projection(&(proj * view));
    let sphere = BoundingSphere::new(DVec3::ZERO, 100.0);
    assert!(!sphere.intersects_frustum(&frustum));
  }

  #[test]
  fn sphere_far_off_axis_is_excluded() {
    let frustum = look_down_neg_z(DVec3::new(0.0, 0.0, 100.0));
    let sphere = BoundingSphere::new(DVec3::new(100_000.0, 0.0, 0.0), 1.0);
    assert!(!sphere.intersects_frustum(&frustum));
  }

  #[test]
  fn touching_plane_counts_as_intersecting() {
    // Hand-built axis-aligned half-space box so the contact is exact.
    let planes = [
      Plane { normal: DVec3::X, d: 10.0 },      // x >= -10
      Plane { normal: DVec3::NEG_X, d: 10.0 },  // x <= 10
      Plane { normal: DVec3::Y, d: 10.0 },
      Plane { normal: DVec3::NEG_Y, d: 10.0 },
      Plane { normal: DVec3::Z, d: 10.0 },
      Plane { normal: DVec3::NEG_Z, d: 10.0 },
    ];
    let frustum = Frustum::new(planes);

    // Center at x=15, radius 5: touches the x <= 10 plane exactly.
    let touching = BoundingSphere::new(DVec3::new(15.0, 0.0, 0.0), 5.0);
    assert!(touching.intersects_frustum(&frustum));

    // Nudged past the boundary: out.
    let outside = BoundingSphere::new(DVec3::new(15.1, 0.0, 0.0), 5.0);
    assert!(!outside.intersects_frustum(&frustum));
  }

  #[test]
  fn distance_to_is_center_distance() {
    let sphere = BoundingSphere::new(DVec3::new(3.0, 4.0, 0.0), 2.0);
    assert_eq!(sphere.distance_to(DVec3::ZERO), 5.0);
  }
}
