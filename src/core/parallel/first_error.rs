//! Set-once error cell.

use super::lock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Holds the first error reported by any worker.
///
/// The first `set` wins; later calls are no-ops and their errors are
/// dropped. `is_set` is a lock-free check so workers can poll it before
/// every item.
#[derive(Debug)]
pub struct FirstError<E> {
    slot: Mutex<Option<E>>,
    set: AtomicBool,
}

impl<E> FirstError<E> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            set: AtomicBool::new(false),
        }
    }

    /// Store `error` if no error has been stored yet.
    ///
    /// Returns `true` when this call won.
    pub fn set(&self, error: E) -> bool {
        let mut slot = lock(&self.slot);
        if slot.is_some() {
            return false;
        }
        *slot = Some(error);
        self.set.store(true, Ordering::Release);
        true
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    pub fn into_inner(self) -> Option<E> {
        self.slot
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<E> Default for FirstError<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn first_writer_wins() {
        let cell = FirstError::new();
        assert!(!cell.is_set());

        assert!(cell.set("first"));
        assert!(!cell.set("second"));
        assert!(cell.is_set());
        assert_eq!(cell.into_inner(), Some("first"));
    }

    #[test]
    fn exactly_one_concurrent_writer_wins() {
        let cell = Arc::new(FirstError::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || cell.set(i))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn empty_cell_yields_none() {
        let cell: FirstError<String> = FirstError::default();
        assert_eq!(cell.into_inner(), None);
    }
}
