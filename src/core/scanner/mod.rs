//! # Scanner Module
//!
//! Finds files with identical content under a directory tree.
//!
//! ## Pipeline
//! 1. **Walk** - one thread enumerates regular files (walkdir)
//! 2. **Hash** - a worker pool streams each file through a digest
//! 3. **Collect** - the calling thread groups paths by digest
//!
//! Stages are connected by bounded queues, so memory stays flat on huge
//! trees. The first walk or hash error stops every stage and is returned.
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::scanner::{DuplicateScanner, ScanConfig};
//!
//! let scanner = DuplicateScanner::new(ScanConfig::default());
//! let duplicates = scanner.scan("/Users/me/Downloads")?;
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{DuplicateScanner, ScanConfig, ScannerBuilder, DEFAULT_QUEUE_CAPACITY};

use crate::core::duplicates::DuplicateSet;
use crate::error::ScanError;
use crate::events::EventSender;
use std::path::Path;

/// Trait for duplicate finders
///
/// Implement this trait to swap in a custom scanner (e.g., for testing).
pub trait DuplicateFinder: Send + Sync {
    /// Scan a directory and return its duplicate groups
    fn find(&self, root: &Path) -> Result<DuplicateSet, ScanError>;

    /// Scan with progress reporting via events
    fn find_with_events(&self, root: &Path, events: &EventSender)
        -> Result<DuplicateSet, ScanError>;
}

impl DuplicateFinder for DuplicateScanner {
    fn find(&self, root: &Path) -> Result<DuplicateSet, ScanError> {
        self.scan(root)
    }

    fn find_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<DuplicateSet, ScanError> {
        self.scan_with_events(root, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scanner_works_behind_trait_object() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), "same").unwrap();
        fs::write(temp_dir.path().join("b"), "same").unwrap();

        let finder: Box<dyn DuplicateFinder> = Box::new(DuplicateScanner::new(ScanConfig::default()));
        let set = finder.find(temp_dir.path()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.duplicate_count(), 1);
    }
}
