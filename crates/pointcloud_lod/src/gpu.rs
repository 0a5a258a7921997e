//! GPU buffer seam and the drawable renderer node.
//!
//! `GpuBackend` is the narrow interface the tree depends on; the real
//! backend (WebGL, wgpu, ...) lives outside this crate and tests use a
//! counting mock. GPU memory moves only inside `upload`/`release` - the
//! visibility flag is free.

use bytemuck::cast_slice;

use crate::error::CapacityError;
use crate::points::{PointData, BYTES_PER_POINT};

/// Opaque GPU buffer handle issued by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// External GPU buffer API.
///
/// Must be called only from the thread that owns the GPU context; worker
/// threads hand decoded data back to the frame loop instead.
pub trait GpuBackend {
  /// Allocate a buffer of the given byte size.
  fn create_buffer(&mut self, bytes: usize) -> BufferId;
  /// Upload bytes into a previously created buffer.
  fn upload_data(&mut self, buffer: BufferId, data: &[u8]);
  /// Free a buffer.
  fn delete_buffer(&mut self, buffer: BufferId);
  /// Largest single buffer the platform supports, in bytes.
  fn max_buffer_bytes(&self) -> usize;
}

/// The four per-node GPU buffers, allocated and freed together.
#[derive(Clone, Copy, Debug)]
pub struct NodeBuffers {
  /// xyz, 3 f32 per point.
  pub positions: BufferId,
  /// 1 f32 per point.
  pub sizes: BufferId,
  /// rgba, 4 f32 per point.
  pub colors: BufferId,
  /// xyz, 3 f32 per point.
  pub normals: BufferId,
}

/// GPU-resident drawable unit: buffers, point count, visibility flag.
///
/// Owned exclusively by the culling node that created it; buffers must be
/// explicitly released - no garbage collection of GPU memory is assumed.
#[derive(Debug, Default)]
pub struct RendererNode {
  visible: bool,
  num_points: u32,
  buffers: Option<NodeBuffers>,
}

impl RendererNode {
  /// Create an empty node with no GPU allocation.
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocate (or replace) the four buffers with `points` data.
  ///
  /// Fails with `CapacityError` before any allocation when a buffer would
  /// exceed the backend limit; a failed upload leaves the node unchanged
  /// except that a previous allocation is kept, not leaked.
  pub fn upload<G: GpuBackend>(
    &mut self,
    gpu: &mut G,
    points: &PointData,
  ) -> Result<(), CapacityError> {
    debug_assert!(points.is_consistent(), "point arrays must agree on count");

    let max_bytes = gpu.max_buffer_bytes();
    let largest = points
      .positions
      .len()
      .max(points.colors.len())
      .max(points.normals.len())
      .max(points.sizes.len())
      * core::mem::size_of::<f32>();
    if largest > max_bytes {
      return Err(CapacityError {
        num_points: points.num_points(),
        requested_bytes: largest as u64,
        max_bytes: max_bytes as u64,
      });
    }

    self.release(gpu);
    self.buffers = Some(NodeBuffers {
      positions: alloc_upload(gpu, &points.positions),
      sizes: alloc_upload(gpu, &points.sizes),
      colors: alloc_upload(gpu, &points.colors),
      normals: alloc_upload(gpu, &points.normals),
    });
    self.num_points = points.num_points();
    Ok(())
  }

  /// Toggle draw eligibility. No GPU work.
  #[inline]
  pub fn set_visible(&mut self, visible: bool) {
    self.visible = visible;
  }

  /// Current draw eligibility.
  #[inline]
  pub fn visible(&self) -> bool {
    self.visible
  }

  /// Number of uploaded points.
  #[inline]
  pub fn num_points(&self) -> u32 {
    self.num_points
  }

  /// True when there is nothing to draw; empty nodes are skipped at draw
  /// time.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.num_points == 0
  }

  /// Buffer handles, when resident.
  pub fn buffers(&self) -> Option<&NodeBuffers> {
    self.buffers.as_ref()
  }

  /// GPU bytes this node currently holds resident.
  pub fn gpu_bytes(&self) -> usize {
    match self.buffers {
      Some(_) => self.num_points as usize * BYTES_PER_POINT,
      None => 0,
    }
  }

  /// Free all four buffers. Idempotent; safe to call repeatedly.
  pub fn release<G: GpuBackend>(&mut self, gpu: &mut G) {
    if let Some(buffers) = self.buffers.take() {
      gpu.delete_buffer(buffers.positions);
      gpu.delete_buffer(buffers.sizes);
      gpu.delete_buffer(buffers.colors);
      gpu.delete_buffer(buffers.normals);
    }
    self.num_points = 0;
    self.visible = false;
  }
}

fn alloc_upload<G: GpuBackend>(gpu: &mut G, data: &[f32]) -> BufferId {
  let bytes: &[u8] = cast_slice(data);
  let buffer = gpu.create_buffer(bytes.len());
  gpu.upload_data(buffer, bytes);
  buffer
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::points::{COLOR_FLOATS, NORMAL_FLOATS, POSITION_FLOATS};

  /// Mock backend tracking live allocations.
  struct CountingGpu {
    next_id: u64,
    live: std::collections::HashSet<BufferId>,
    max_bytes: usize,
  }

  impl CountingGpu {
    fn new(max_bytes: usize) -> Self {
      Self {
        next_id: 0,
        live: Default::default(),
        max_bytes,
      }
    }
  }

  impl GpuBackend for CountingGpu {
    fn create_buffer(&mut self, _bytes: usize) -> BufferId {
      let id = BufferId(self.next_id);
      self.next_id += 1;
      self.live.insert(id);
      id
    }

    fn upload_data(&mut self, buffer: BufferId, _data: &[u8]) {
      assert!(self.live.contains(&buffer), "upload into freed buffer");
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
      assert!(self.live.remove(&buffer), "double free");
    }

    fn max_buffer_bytes(&self) -> usize {
      self.max_bytes
    }
  }

  fn dummy(n: usize) -> PointData {
    PointData {
      positions: vec![0.0; n * POSITION_FLOATS],
      sizes: vec![1.0; n],
      colors: vec![0.5; n * COLOR_FLOATS],
      normals: vec![0.0; n * NORMAL_FLOATS],
    }
  }

  #[test]
  fn upload_then_release_leaves_nothing_allocated() {
    let mut gpu = CountingGpu::new(usize::MAX);
    let mut node = RendererNode::new();

    node.upload(&mut gpu, &dummy(500)).unwrap();
    assert_eq!(gpu.live.len(), 4);
    assert_eq!(node.num_points(), 500);
    assert_eq!(node.gpu_bytes(), 500 * BYTES_PER_POINT);

    node.release(&mut gpu);
    assert!(gpu.live.is_empty());
    assert_eq!(node.gpu_bytes(), 0);
    assert!(node.is_empty());
  }

  #[test]
  fn release_is_idempotent() {
    let mut gpu = CountingGpu::new(usize::MAX);
    let mut node = RendererNode::new();

    node.upload(&mut gpu, &dummy(3)).unwrap();
    node.release(&mut gpu);
    node.release(&mut gpu);
    node.release(&mut gpu);
    assert!(gpu.live.is_empty());
  }

  #[test]
  fn re_upload_replaces_previous_buffers() {
    let mut gpu = CountingGpu::new(usize::MAX);
    let mut node = RendererNode::new();

    node.upload(&mut gpu, &dummy(10)).unwrap();
    node.upload(&mut gpu, &dummy(20)).unwrap();
    // Old four freed, new four live.
    assert_eq!(gpu.live.len(), 4);
    assert_eq!(node.num_points(), 20);
  }

  #[test]
  fn capacity_error_allocates_nothing() {
    // Limit below the color buffer of 100 points (100 * 4 * 4 bytes).
    let mut gpu = CountingGpu::new(1000);
    let mut node = RendererNode::new();

    let err = node.upload(&mut gpu, &dummy(100)).unwrap_err();
    assert_eq!(err.num_points, 100);
    assert_eq!(err.max_bytes, 1000);
    assert!(gpu.live.is_empty());
    assert!(node.is_empty());
  }

  #[test]
  fn visibility_flag_is_free() {
    let mut node = RendererNode::new();
    assert!(!node.visible());
    node.set_visible(true);
    assert!(node.visible());
  }
}
