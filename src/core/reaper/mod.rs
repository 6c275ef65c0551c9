//! # Reaper Module
//!
//! Deletes duplicate files, keeping one copy per group.
//!
//! Deletion is best-effort. Every file that was actually removed is reported,
//! even when some other deletion failed. Nothing is rolled back and nothing is
//! retried.
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::reaper::DuplicateReaper;
//!
//! let reaper = DuplicateReaper::new(PoolConfig::uncapped())?;
//! let outcome = reaper.reap(&duplicates);
//! println!("removed {} files", outcome.deleted.len());
//! if let Some(error) = outcome.error {
//!     eprintln!("stopped early: {}", error);
//! }
//! ```

mod plan;

pub use plan::ReapPlan;

use crate::core::duplicates::DuplicateSet;
use crate::core::parallel::{lock, CancellationToken, FirstError, PoolConfig, WorkerPool};
use crate::error::{PoolError, ReapError, ReapFailure};
use crate::events::{null_sender, Event, EventSender, ReapEvent};
use crossbeam_channel::unbounded;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of a deletion batch: what was removed, and what stopped it.
#[derive(Debug, Default)]
pub struct ReapOutcome {
    /// Paths removed, in completion order
    pub deleted: Vec<PathBuf>,
    /// First error, if any deletion failed
    pub error: Option<ReapError>,
}

impl ReapOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Convert to a `Result`, keeping the partial list inside the error.
    pub fn into_result(self) -> Result<Vec<PathBuf>, ReapFailure> {
        match self.error {
            None => Ok(self.deleted),
            Some(source) => Err(ReapFailure {
                deleted: self.deleted,
                source,
            }),
        }
    }
}

/// Deletes every non-keeper path of a [`DuplicateSet`] on a bounded pool.
///
/// Workers pull targets from a shared queue. A worker that fails to delete a
/// file stops; the other workers keep going, so one bad file does not leave
/// the rest of the batch undone.
pub struct DuplicateReaper {
    pool: WorkerPool,
}

impl DuplicateReaper {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// The deletion plan for `set`, without touching the filesystem
    pub fn plan(&self, set: &DuplicateSet) -> ReapPlan {
        ReapPlan::from_set(set)
    }

    /// Delete all but the first path of every group
    pub fn reap(&self, set: &DuplicateSet) -> ReapOutcome {
        self.execute(&ReapPlan::from_set(set), &null_sender(), &CancellationToken::new())
    }

    /// Delete with per-file events
    pub fn reap_with_events(&self, set: &DuplicateSet, events: &EventSender) -> ReapOutcome {
        self.execute(&ReapPlan::from_set(set), events, &CancellationToken::new())
    }

    /// Delete until done or `cancel` fires
    pub fn reap_with_cancel(
        &self,
        set: &DuplicateSet,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> ReapOutcome {
        self.execute(&ReapPlan::from_set(set), events, cancel)
    }

    /// Execute an existing plan
    pub fn execute(
        &self,
        plan: &ReapPlan,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> ReapOutcome {
        let total = plan.targets.len();
        info!(
            targets = total,
            workers = self.pool.worker_count(),
            "deleting duplicates"
        );
        events.send(Event::Reap(ReapEvent::Started { targets: total }));

        if total == 0 {
            events.send(Event::Reap(ReapEvent::Completed {
                deleted: 0,
                failed: false,
            }));
            return ReapOutcome::default();
        }

        let (task_tx, task_rx) = unbounded::<&PathBuf>();
        for target in &plan.targets {
            let _ = task_tx.send(target);
        }
        drop(task_tx);

        let deleted: Mutex<Vec<PathBuf>> = Mutex::new(Vec::with_capacity(total));
        let first_error: FirstError<ReapError> = FirstError::new();
        let skipped = AtomicBool::new(false);

        self.pool.run_workers(|worker| {
            for path in task_rx.iter() {
                if cancel.is_cancelled() {
                    skipped.store(true, Ordering::Relaxed);
                    break;
                }

                match fs::remove_file(path) {
                    Ok(()) => {
                        debug!(worker, path = %path.display(), "deleted");
                        lock(&deleted).push(path.clone());
                        events.send(Event::Reap(ReapEvent::Deleted { path: path.clone() }));
                    }
                    Err(source) => {
                        warn!(worker, path = %path.display(), error = %source, "delete failed");
                        events.send(Event::Reap(ReapEvent::Failed {
                            path: path.clone(),
                            message: source.to_string(),
                        }));
                        first_error.set(ReapError::Delete {
                            path: path.clone(),
                            source,
                        });
                        break;
                    }
                }
            }
        });

        let deleted = deleted
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut error = first_error.into_inner();

        if error.is_none() && (skipped.into_inner() || !task_rx.is_empty()) {
            error = Some(ReapError::Cancelled);
        }

        info!(
            deleted = deleted.len(),
            failed = error.is_some(),
            "deletion finished"
        );
        events.send(Event::Reap(ReapEvent::Completed {
            deleted: deleted.len(),
            failed: error.is_some(),
        }));

        ReapOutcome { deleted, error }
    }
}
