//! Concurrency governor shared by every fetch in a batch
//!
//! This module handles:
//! - A global semaphore bounding in-flight requests
//! - RAII slots that release on every exit path, including cancellation
//! - In-flight and peak counters for tests and reporting

use crate::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of simultaneously in-flight fetches
///
/// Cloning a governor shares the same slots; one governor is created per
/// [`Harvester`](crate::Harvester) and serves every site in a batch.
#[derive(Debug, Clone)]
pub struct Governor {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One held governor slot
///
/// Dropping the slot returns it to the governor.
#[derive(Debug)]
pub struct GovernorSlot {
    in_flight: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl Governor {
    /// Creates a governor with `capacity` slots
    ///
    /// Capacity is validated to be at least 1 before a governor is built.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free slot
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::GovernorClosed` if the governor was closed.
    pub async fn acquire(&self) -> crate::Result<GovernorSlot> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| HarvestError::GovernorClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GovernorSlot {
            in_flight: Arc::clone(&self.in_flight),
            _permit: permit,
        })
    }

    /// Closes the governor; pending and future acquisitions fail
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Number of slots currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for GovernorSlot {
    fn drop(&mut self) {
        // Runs before the permit field is dropped
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
