//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the batch operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Duplicate scan events
    Scan(ScanEvent),
    /// Duplicate deletion events
    Reap(ReapEvent),
    /// Image conversion events
    Convert(ConvertEvent),
}

/// Events during a duplicate scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking has started at this root
    Started { root: PathBuf },
    /// A file was hashed
    Progress(ScanProgress),
    /// The scan finished successfully
    Completed(ScanSummary),
    /// The scan was aborted
    Failed { message: String },
}

/// Progress information while hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Files hashed so far
    pub files_hashed: usize,
    /// Bytes hashed so far
    pub bytes_hashed: u64,
    /// Most recently hashed file
    pub current_path: PathBuf,
}

/// Totals for a finished scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_hashed: usize,
    pub bytes_hashed: u64,
    pub duplicate_groups: usize,
    /// Files that could be removed (group members minus keepers)
    pub duplicate_files: usize,
    pub duration_ms: u64,
}

/// Events during duplicate deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReapEvent {
    /// Deletion has started
    Started { targets: usize },
    /// A file was removed
    Deleted { path: PathBuf },
    /// A file could not be removed; its worker stops
    Failed { path: PathBuf, message: String },
    /// All workers have finished
    Completed { deleted: usize, failed: bool },
}

/// Events during image conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConvertEvent {
    /// Conversion has started
    Started { total: usize, format: String },
    /// A file finished converting
    Progress(ConvertProgress),
    /// Every file converted
    Completed { total: usize, duration_ms: u64 },
}

/// Per-file conversion progress.
///
/// `current` counts completions, so it rises monotonically even though
/// files finish out of input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertProgress {
    pub current: usize,
    pub total: usize,
    pub path: PathBuf,
    /// Written file, when converting to a folder
    pub output: Option<PathBuf>,
}
