//! Decoded CPU-side point data.
//!
//! Fixed per-point layout: position 3 f32, size 1 f32, color 4 f32,
//! normal 3 f32. The four arrays always describe the same point count;
//! anything else is a decode error.

/// Floats per point in the position buffer.
pub const POSITION_FLOATS: usize = 3;
/// Floats per point in the size buffer.
pub const SIZE_FLOATS: usize = 1;
/// Floats per point in the color buffer.
pub const COLOR_FLOATS: usize = 4;
/// Floats per point in the normal buffer.
pub const NORMAL_FLOATS: usize = 3;

/// Total GPU bytes one point occupies across all four buffers.
pub const BYTES_PER_POINT: usize =
  (POSITION_FLOATS + SIZE_FLOATS + COLOR_FLOATS + NORMAL_FLOATS) * core::mem::size_of::<f32>();

/// Raw decoded point arrays, ready for upload.
///
/// Transient: consumed once to populate a renderer node, then dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
  /// xyz triples.
  pub positions: Vec<f32>,
  /// One splat size per point.
  pub sizes: Vec<f32>,
  /// rgba quadruples.
  pub colors: Vec<f32>,
  /// xyz triples.
  pub normals: Vec<f32>,
}

impl PointData {
  /// Number of points described by the size buffer.
  #[inline]
  pub fn num_points(&self) -> u32 {
    self.sizes.len() as u32
  }

  /// True when all four arrays agree on the point count.
  pub fn is_consistent(&self) -> bool {
    let n = self.sizes.len();
    self.positions.len() == n * POSITION_FLOATS
      && self.colors.len() == n * COLOR_FLOATS
      && self.normals.len() == n * NORMAL_FLOATS
  }

  /// True when there is nothing to draw.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.sizes.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Build consistent dummy data with `n` points.
  fn dummy(n: usize) -> PointData {
    PointData {
      positions: vec![0.0; n * POSITION_FLOATS],
      sizes: vec![1.0; n],
      colors: vec![0.5; n * COLOR_FLOATS],
      normals: vec![0.0; n * NORMAL_FLOATS],
    }
  }

  #[test]
  fn consistent_counts() {
    assert!(dummy(0).is_consistent());
    assert!(dummy(7).is_consistent());
    assert_eq!(dummy(7).num_points(), 7);
  }

  #[test]
  fn mismatched_counts_are_inconsistent() {
    let mut data = dummy(4);
    data.colors.pop();
    assert!(!data.is_consistent());

    let mut data = dummy(4);
    data.positions.extend([0.0; 3]);
    assert!(!data.is_consistent());
  }

  #[test]
  fn bytes_per_point_layout() {
    // 11 floats: 3 + 1 + 4 + 3.
    assert_eq!(BYTES_PER_POINT, 44);
  }
}
