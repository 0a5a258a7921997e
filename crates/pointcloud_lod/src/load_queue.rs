//! Non-blocking load dispatch and completion hand-back.
//!
//! Loads run out-of-band on rayon's thread pool; completions come back
//! over a crossbeam channel and are drained from the frame loop with
//! `try_recv` - `dispatch` and `drain_completions` never block.
//!
//! An in-flight id set suppresses duplicate dispatches: each id resolves
//! exactly once per dispatch, and an id is never simultaneously in flight
//! twice.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, Sender};
use web_time::Instant;

use crate::error::LoadError;
use crate::loader::{LodLoader, LodNode, NodeId};

/// Completed load, success or failure.
pub struct LoadCompletion {
  /// Id the load was dispatched for.
  pub id: NodeId,
  /// Decoded payload or the loader's error.
  pub result: Result<LodNode, LoadError>,
  /// Wall time the fetch+decode took on the worker, in microseconds.
  pub load_us: u64,
}

/// Dispatch queue pairing a loader with rayon workers.
pub struct LoadQueue<L: LodLoader + 'static> {
  loader: Arc<L>,
  sender: Sender<LoadCompletion>,
  receiver: Receiver<LoadCompletion>,
  in_flight: HashSet<NodeId>,
}

impl<L: LodLoader + 'static> LoadQueue<L> {
  /// Create a queue around a shared loader.
  pub fn new(loader: Arc<L>) -> Self {
    let (sender, receiver) = channel::unbounded();
    Self {
      loader,
      sender,
      receiver,
      in_flight: HashSet::new(),
    }
  }

  /// Fire a load for `id` on the worker pool (non-blocking).
  ///
  /// Returns `false` without dispatching when the id is already in flight.
  pub fn dispatch(&mut self, id: &NodeId) -> bool {
    if self.in_flight.contains(id) {
      return false;
    }
    self.in_flight.insert(id.clone());

    let loader = Arc::clone(&self.loader);
    let sender = self.sender.clone();
    let id = id.clone();
    rayon::spawn(move || {
      let start = Instant::now();
      let result = loader.load_node(&id);
      let load_us = start.elapsed().as_micros() as u64;
      // Send error means the queue was dropped; the result is discarded.
      let _ = sender.send(LoadCompletion { id, result, load_us });
    });
    true
  }

  /// Drain all completions that have arrived (non-blocking).
  ///
  /// Clears the drained ids from the in-flight set.
  pub fn drain_completions(&mut self) -> Vec<LoadCompletion> {
    let mut completions = Vec::new();
    while let Ok(completion) = self.receiver.try_recv() {
      self.in_flight.remove(&completion.id);
      completions.push(completion);
    }
    completions
  }

  /// Check whether an id has a pending load.
  pub fn is_in_flight(&self, id: &NodeId) -> bool {
    self.in_flight.contains(id)
  }

  /// Number of loads currently in flight.
  pub fn in_flight_count(&self) -> usize {
    self.in_flight.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bounds::BoundingSphere;
  use crate::points::PointData;
  use glam::DVec3;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct CountingLoader {
    calls: AtomicUsize,
    fail: bool,
  }

  impl CountingLoader {
    fn new(fail: bool) -> Self {
      Self {
        calls: AtomicUsize::new(0),
        fail,
      }
    }
  }

  impl LodLoader for CountingLoader {
    fn load_node(&self, id: &NodeId) -> Result<LodNode, LoadError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(LoadError::new(id.as_str(), "decode failed"));
      }
      Ok(LodNode {
        id: id.clone(),
        bounding_sphere: BoundingSphere::new(DVec3::ZERO, 1.0),
        detail_level: 0,
        points: PointData::default(),
        children: Vec::new(),
      })
    }
  }

  fn drain_one<L: LodLoader>(queue: &mut LoadQueue<L>) -> LoadCompletion {
    for _ in 0..1000 {
      let mut completions = queue.drain_completions();
      if let Some(completion) = completions.pop() {
        return completion;
      }
      std::thread::sleep(std::time::Duration::from_millis(1));
    }
    panic!("load never completed");
  }

  #[test]
  fn dispatch_and_drain() {
    let loader = Arc::new(CountingLoader::new(false));
    let mut queue = LoadQueue::new(Arc::clone(&loader));

    let id = NodeId::from("root");
    assert!(queue.dispatch(&id));
    assert!(queue.is_in_flight(&id));

    let completion = drain_one(&mut queue);
    assert_eq!(completion.id, id);
    assert!(completion.result.is_ok());
    assert!(!queue.is_in_flight(&id));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn duplicate_dispatch_is_suppressed() {
    let loader = Arc::new(CountingLoader::new(false));
    let mut queue = LoadQueue::new(Arc::clone(&loader));

    let id = NodeId::from("root");
    assert!(queue.dispatch(&id));
    assert!(!queue.dispatch(&id));
    assert_eq!(queue.in_flight_count(), 1);

    drain_one(&mut queue);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    // After completion the id may be dispatched again.
    assert!(queue.dispatch(&id));
  }

  #[test]
  fn failure_is_reported_not_swallowed() {
    let loader = Arc::new(CountingLoader::new(true));
    let mut queue = LoadQueue::new(loader);

    let id = NodeId::from("broken");
    assert!(queue.dispatch(&id));
    let completion = drain_one(&mut queue);
    assert!(completion.result.is_err());
    assert!(!queue.is_in_flight(&id));
  }
}
