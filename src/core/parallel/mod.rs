//! # Parallel Module
//!
//! The bounded worker pool every batch operation runs on.
//!
//! ## Guarantees
//! - A fixed number of workers pull item indices from one shared queue
//! - Results are written back by index, so output order equals input order
//!   no matter which worker finishes first
//! - The first error wins; later errors are dropped and remaining items are
//!   abandoned
//! - Worker count changes timing only, never results
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::parallel::{PoolConfig, WorkerPool};
//!
//! let pool = WorkerPool::new(PoolConfig::default())?;
//! let squares = pool.map(&[1, 2, 3, 4, 5], |_, x| Ok::<_, MyError>(x * x))?;
//! assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! ```

mod cancel;
mod first_error;
mod pool;

pub use cancel::CancellationToken;
pub use first_error::FirstError;
pub use pool::{parallel_map, PoolConfig, WorkerPool, DEFAULT_MAX_WORKERS};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, ignoring poisoning. Worker panics resurface through the
/// pool itself.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
