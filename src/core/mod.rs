//! # Core Module
//!
//! The UI-agnostic batch engine.
//!
//! ## Modules
//! - `parallel` - Bounded worker pool and ordered parallel map
//! - `hasher` - Streams files through a content digest
//! - `duplicates` - Digest records and duplicate groups
//! - `scanner` - Finds duplicate files under a directory
//! - `reaper` - Deletes duplicates, keeping one copy per group
//! - `converter` - Bulk image conversion
//! - `rename` - Batch renaming in place

pub mod converter;
pub mod duplicates;
pub mod hasher;
pub mod parallel;
pub mod reaper;
pub mod rename;
pub mod scanner;

// Re-export commonly used types
pub use converter::{BatchConverter, ConversionRecorder, ConvertOptions, OutputFormat};
pub use duplicates::{DigestRecord, DuplicateSet};
pub use hasher::{ContentHasher, DigestAlgorithm};
pub use parallel::{parallel_map, CancellationToken, PoolConfig, WorkerPool};
pub use reaper::{DuplicateReaper, ReapOutcome, ReapPlan};
pub use rename::{BatchRenamer, RenameOptions};
pub use scanner::{DuplicateScanner, ScanConfig};
