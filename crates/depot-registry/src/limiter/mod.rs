//! Process-wide admission control for upstream fetches
//!
//! Every fetch attempt, whether for a catalog document or an asset, holds
//! one slot while it runs. Waiters are admitted strictly in arrival order:
//! the underlying tokio semaphore is fair, and dropping a slot hands it to
//! the oldest waiter before control returns to the caller.

use std::sync::Arc;

use depot_core::error::DepotError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::RegistryResult;

/// Bounded FIFO admission gate shared by all fetches
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Permission to run one fetch; released on drop
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionLimiter {
    /// Create a limiter admitting at most `capacity` concurrent fetches
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a slot, queueing behind earlier callers
    pub async fn acquire(&self) -> RegistryResult<AdmissionSlot> {
        if self.semaphore.available_permits() == 0 {
            debug!("Waiting for a fetch slot ({} in flight)", self.capacity);
        }

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| DepotError::network("Admission limiter closed".to_string(), e))?;

        Ok(AdmissionSlot { _permit: permit })
    }

    /// Maximum concurrent fetches
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

impl AdmissionSlot {
    /// Give the slot back to the limiter
    pub fn release(self) {}
}
