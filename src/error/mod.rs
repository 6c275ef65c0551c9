//! # Error Module
//!
//! Error types for the batch tools.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every I/O failure names the path it failed on
//! - **First error wins** - batch primitives report one error, not a list
//! - **Partial success is data** - deletions that already happened are
//!   reported alongside the error, never dropped

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AltesseError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Deletion error: {0}")]
    Reap(#[from] ReapFailure),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Rename error: {0}")]
    Rename(#[from] RenameError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while building a worker pool
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid worker count: {count} (must be at least 1)")]
    InvalidWorkerCount { count: usize },

    #[error("Failed to start worker threads: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Error returned by the bounded parallel map.
///
/// Only the first task failure (by arrival time) is kept.
#[derive(Error, Debug)]
pub enum MapError<E> {
    #[error("item {index}: {source}")]
    Task {
        index: usize,
        #[source]
        source: E,
    },

    #[error("Batch was cancelled")]
    Cancelled,

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl<E> MapError<E> {
    /// Index of the failed item, if a task failed.
    pub fn index(&self) -> Option<usize> {
        match self {
            MapError::Task { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Unwrap the task error, discarding its index.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            MapError::Task { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors that occur while hashing file contents
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Path of the file that could not be hashed
    pub fn path(&self) -> &PathBuf {
        match self {
            HashError::Io { path, .. } => path,
        }
    }
}

/// Errors that abort a duplicate scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to walk directory tree at {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur while deleting duplicates
#[derive(Error, Debug)]
pub enum ReapError {
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Deletion was cancelled")]
    Cancelled,
}

/// A deletion batch that stopped early.
///
/// `deleted` lists every file that was removed before (and while) the
/// failure happened. Those removals are not rolled back.
#[derive(Error, Debug)]
#[error("{source} ({} file(s) already deleted)", .deleted.len())]
pub struct ReapFailure {
    pub deleted: Vec<PathBuf>,
    #[source]
    pub source: ReapError,
}

/// Errors that occur during image conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {format}: {source}")]
    Encode {
        format: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<ConvertError>,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Conversion was cancelled")]
    Cancelled,
}

impl From<MapError<ConvertError>> for ConvertError {
    fn from(error: MapError<ConvertError>) -> Self {
        match error {
            MapError::Task { index, source } => ConvertError::Item {
                index,
                source: Box::new(source),
            },
            MapError::Cancelled => ConvertError::Cancelled,
            MapError::Pool(e) => ConvertError::Pool(e),
        }
    }
}

/// Errors from the usage statistics file
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Failed to read statistics file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write statistics file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Statistics file {path} is corrupted: {source}. Delete this file to start fresh.")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize statistics: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors from a batch rename.
///
/// Renames run in input order, so every item before `index` has already
/// been renamed and stays renamed.
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("item {index}: {path} has no file name")]
    InvalidPath { index: usize, path: PathBuf },

    #[error("item {index}: {path} already exists")]
    Exists { index: usize, path: PathBuf },

    #[error("item {index}: failed to rename {path}: {source}")]
    Rename {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenameError {
    /// Position of the item that failed
    pub fn index(&self) -> usize {
        match self {
            RenameError::InvalidPath { index, .. }
            | RenameError::Exists { index, .. }
            | RenameError::Rename { index, .. } => *index,
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AltesseError>;
