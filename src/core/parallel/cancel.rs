//! Cooperative cancellation shared between a caller and pool workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A clonable flag that asks running batches to stop.
///
/// Workers check it before pulling the next item; work already in flight
/// is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
