//! Queue for terrain edits produced off the simulation thread.
//!
//! Physics contact callbacks and gameplay systems publish [`TerrainEdit`]s
//! here; the simulation thread drains them into the terrain with
//! [`Terrain::apply_edits`](crate::terrain::Terrain::apply_edits) before the
//! next regeneration.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use glam::Vec2;
use tracing::warn;

/// A single world-space density edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainEdit {
    /// Write one sample
    Point {
        /// World position
        position: Vec2,
        /// Density value
        value: i8,
    },
    /// Stamp a disc
    Circle {
        /// World centre
        center: Vec2,
        /// Radius in world units
        radius: f32,
        /// Density value
        value: i8,
    },
}

/// Bounded multi-producer edit queue.
pub struct EditQueue {
    sender: Sender<TerrainEdit>,
    receiver: Receiver<TerrainEdit>,
    capacity: usize,
}

impl Default for EditQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EditQueue {
    /// Creates a queue holding at most `capacity` pending edits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Queues an edit. Returns false if the queue is full and the edit was
    /// dropped.
    pub fn publish(&self, edit: TerrainEdit) -> bool {
        match self.sender.try_send(edit) {
            Ok(()) => true,
            Err(TrySendError::Full(edit)) => {
                warn!("Edit queue full ({}), dropping {:?}", self.capacity, edit);
                false
            },
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Takes every pending edit in publish order.
    pub fn drain(&self) -> Vec<TerrainEdit> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending edits.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Maximum number of pending edits.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a sender for another producer thread.
    #[must_use]
    pub fn sender(&self) -> Sender<TerrainEdit> {
        self.sender.clone()
    }
}
