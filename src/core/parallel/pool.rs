//! Fixed-size worker pool and the bounded parallel map built on it.

use super::{lock, CancellationToken, FirstError};
use crate::error::{MapError, PoolError};
use crossbeam_channel::unbounded;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::debug;

/// Upper bound for the default worker count.
///
/// Image encoding is CPU bound; running more encoders than this mostly
/// adds memory pressure.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Number of workers a pool runs. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    worker_count: usize,
}

impl PoolConfig {
    /// Explicit worker count. Zero is rejected.
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        if worker_count == 0 {
            return Err(PoolError::InvalidWorkerCount {
                count: worker_count,
            });
        }
        Ok(Self { worker_count })
    }

    /// One worker per available execution unit, without the cap.
    pub fn uncapped() -> Self {
        Self {
            worker_count: available_parallelism(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Default for PoolConfig {
    /// Available parallelism, capped at [`DEFAULT_MAX_WORKERS`]
    fn default() -> Self {
        Self {
            worker_count: available_parallelism().min(DEFAULT_MAX_WORKERS),
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// A fixed set of worker threads.
///
/// Every batch runs exactly one long-lived worker task per thread. Workers
/// pull from a shared queue, so a few slow items never hold up the rest.
pub struct WorkerPool {
    pool: ThreadPool,
    worker_count: usize,
}

impl WorkerPool {
    /// Start the worker threads.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .thread_name(|i| format!("altesse-worker-{}", i))
            .build()?;

        Ok(Self {
            pool,
            worker_count: config.worker_count(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run `worker` once on every pool thread and wait for all of them.
    ///
    /// The argument is the worker's index in `0..worker_count`.
    pub fn run_workers<F>(&self, worker: F)
    where
        F: Fn(usize) + Sync,
    {
        self.pool.broadcast(|ctx| worker(ctx.index()));
    }

    /// Apply `f` to every item, returning results in input order.
    ///
    /// On failure only the first error (by arrival time) is returned, tagged
    /// with its item index. No partial results are returned with an error.
    pub fn map<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, MapError<E>>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(usize, &T) -> Result<R, E> + Sync,
    {
        self.map_with_cancel(items, &CancellationToken::new(), f)
    }

    /// Like [`WorkerPool::map`], but stops pulling items once `cancel` fires.
    ///
    /// Returns [`MapError::Cancelled`] if any item was skipped because of
    /// cancellation and no task error was recorded first.
    pub fn map_with_cancel<T, R, E, F>(
        &self,
        items: &[T],
        cancel: &CancellationToken,
        f: F,
    ) -> Result<Vec<R>, MapError<E>>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(usize, &T) -> Result<R, E> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            items = items.len(),
            workers = self.worker_count,
            "starting parallel map"
        );

        let (task_tx, task_rx) = unbounded::<usize>();
        for index in 0..items.len() {
            // Receiver is alive for the whole function.
            let _ = task_tx.send(index);
        }
        drop(task_tx);

        let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..items.len()).map(|_| None).collect());
        let first_error: FirstError<(usize, E)> = FirstError::new();

        self.run_workers(|_| {
            for index in task_rx.iter() {
                if first_error.is_set() || cancel.is_cancelled() {
                    break;
                }
                match f(index, &items[index]) {
                    Ok(value) => lock(&slots)[index] = Some(value),
                    Err(error) => {
                        if first_error.set((index, error)) {
                            debug!(index, "parallel map failed, abandoning remaining items");
                        }
                        break;
                    }
                }
            }
        });

        if let Some((index, source)) = first_error.into_inner() {
            return Err(MapError::Task { index, source });
        }

        slots
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .into_iter()
            .collect::<Option<Vec<R>>>()
            .ok_or(MapError::Cancelled)
    }
}

/// One-shot convenience: build a pool of `worker_count` threads and map.
pub fn parallel_map<T, R, E, F>(
    items: &[T],
    worker_count: usize,
    f: F,
) -> Result<Vec<R>, MapError<E>>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(usize, &T) -> Result<R, E> + Sync,
{
    let pool = WorkerPool::new(PoolConfig::new(worker_count)?)?;
    pool.map(items, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Boom(usize);

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom at {}", self.0)
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn squares_in_input_order() {
        let items = [1, 2, 3, 4, 5];
        let results = parallel_map(&items, 2, |_, x| Ok::<_, Boom>(x * x)).unwrap();
        assert_eq!(results, vec![1, 4, 9, 16, 25]);
    }

    #[test]
    fn empty_input_returns_empty_output() {
        let items: [u32; 0] = [];
        for workers in 1..=4 {
            let results = parallel_map(&items, workers, |_, x| Ok::<_, Boom>(*x)).unwrap();
            assert!(results.is_empty());
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result = parallel_map(&[1], 0, |_, x| Ok::<_, Boom>(*x));
        assert!(matches!(
            result,
            Err(MapError::Pool(PoolError::InvalidWorkerCount { count: 0 }))
        ));
    }

    #[test]
    fn error_at_index_two_fails_whole_batch() {
        let items = [10, 20, 30, 40, 50];
        let result = parallel_map(&items, 3, |i, x| {
            if i == 2 {
                Err(Boom(i))
            } else {
                Ok(x + 1)
            }
        });

        match result {
            Err(MapError::Task { index, source }) => {
                assert_eq!(index, 2);
                assert_eq!(source, Boom(2));
            }
            other => panic!("expected task error, got {:?}", other),
        }
    }

    #[test]
    fn only_one_error_is_reported() {
        let items: Vec<usize> = (0..50).collect();
        let result = parallel_map(&items, 4, |i, _| Err::<(), _>(Boom(i)));

        let error = result.unwrap_err();
        let index = error.index().unwrap();
        assert!(index < items.len());
        assert_eq!(error.into_task_error(), Some(Boom(index)));
    }

    #[test]
    fn results_match_function_for_uneven_work() {
        let items: Vec<u64> = (0..40).collect();
        let results = parallel_map(&items, 4, |i, x| {
            // Early items are slow so later ones finish first.
            if i % 7 == 0 {
                thread::sleep(Duration::from_millis(5));
            }
            Ok::<_, Boom>(x * 3 + i as u64)
        })
        .unwrap();

        assert_eq!(results.len(), items.len());
        for (i, value) in results.iter().enumerate() {
            assert_eq!(*value, items[i] * 3 + i as u64);
        }
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let items: Vec<i64> = (-20..20).collect();
        let baseline = parallel_map(&items, 1, |i, x| Ok::<_, Boom>(x * x - i as i64)).unwrap();

        for workers in [2, 3, 8, 64] {
            let results =
                parallel_map(&items, workers, |i, x| Ok::<_, Boom>(x * x - i as i64)).unwrap();
            assert_eq!(results, baseline);
        }
    }

    #[test]
    fn workers_stop_pulling_after_first_error() {
        let items: Vec<usize> = (0..1000).collect();
        let calls = AtomicUsize::new(0);

        let pool = WorkerPool::new(PoolConfig::new(1).unwrap()).unwrap();
        let result = pool.map(&items, |i, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            if i == 3 {
                Err(Boom(i))
            } else {
                Ok(i)
            }
        });

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn cancelled_map_reports_cancellation() {
        let items: Vec<usize> = (0..100).collect();
        let token = CancellationToken::new();
        let pool = WorkerPool::new(PoolConfig::new(1).unwrap()).unwrap();

        let result = pool.map_with_cancel(&items, &token, |i, _| {
            if i == 10 {
                token.cancel();
            }
            Ok::<_, Boom>(i)
        });

        assert!(matches!(result, Err(MapError::Cancelled)));
    }

    #[test]
    fn pool_is_reusable() {
        let pool = WorkerPool::new(PoolConfig::new(3).unwrap()).unwrap();
        assert_eq!(pool.worker_count(), 3);

        let first = pool.map(&[1, 2, 3], |_, x| Ok::<_, Boom>(x * 2)).unwrap();
        let second = pool.map(&["a", "bb"], |_, s| Ok::<_, Boom>(s.len())).unwrap();

        assert_eq!(first, vec![2, 4, 6]);
        assert_eq!(second, vec![1, 2]);
    }

    #[test]
    fn run_workers_runs_once_per_thread() {
        let pool = WorkerPool::new(PoolConfig::new(4).unwrap()).unwrap();
        let seen = Mutex::new(Vec::new());

        pool.run_workers(|worker| lock(&seen).push(worker));

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn default_config_is_capped() {
        let config = PoolConfig::default();
        assert!(config.worker_count() >= 1);
        assert!(config.worker_count() <= DEFAULT_MAX_WORKERS);
        assert!(PoolConfig::uncapped().worker_count() >= config.worker_count());
    }
}
