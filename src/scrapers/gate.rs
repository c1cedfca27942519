//! Named concurrency gate shared by every request of one kind.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::FetchError;

#[derive(Clone, Debug)]
pub struct FetchGate {
    name: &'static str,
    width: usize,
    permits: Arc<Semaphore>,
}

impl FetchGate {
    /// A width of zero is clamped to one.
    pub fn new(name: &'static str, width: usize) -> Self {
        let width = width.max(1);
        Self {
            name,
            width,
            permits: Arc::new(Semaphore::new(width)),
        }
    }

    /// Wait for a free slot; the slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, FetchError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FetchError::GateClosed { gate: self.name })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
