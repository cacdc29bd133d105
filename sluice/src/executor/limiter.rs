//! Capacity limiter.
//!
//! A semaphore-backed admission gate: a task body may only run while its
//! unit of execution holds a [`SlotPermit`]. The limiter also tracks how many
//! bodies are running and the highest concurrency observed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity admission gate shared by all units of an executor.
#[derive(Debug)]
pub(crate) struct CapacityLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    running: Arc<AtomicUsize>,
    peak_running: AtomicUsize,
}

impl CapacityLimiter {
    /// Creates a limiter with `capacity` slots. Callers validate `capacity > 0`.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            running: Arc::new(AtomicUsize::new(0)),
            peak_running: AtomicUsize::new(0),
        }
    }

    /// Waits for a free slot.
    pub(crate) async fn acquire(&self) -> Result<SlotPermit, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        let current = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_peak(current);

        Ok(SlotPermit {
            _permit: permit,
            running: Arc::clone(&self.running),
        })
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_running.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_running.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub(crate) fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Task bodies currently holding a slot.
    pub(crate) fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at once.
    pub(crate) fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::Relaxed)
    }
}

/// A held slot; released when dropped.
pub(crate) struct SlotPermit {
    _permit: OwnedSemaphorePermit,
    running: Arc<AtomicUsize>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}
