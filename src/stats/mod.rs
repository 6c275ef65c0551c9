//! # Stats Module
//!
//! Persistent usage statistics for image conversion.
//!
//! The statistics live in one JSON file. Every change goes through
//! [`StatsStore::update`], which holds an exclusive guard for the whole
//! load → mutate → persist sequence, so concurrent workers never lose an
//! increment. Writes go to a temporary file that is then renamed over the
//! old one.

mod types;

pub use types::{FormatStats, StatsSummary, UsageStats, CD_BYTES, FLOPPY_BYTES};

use crate::core::converter::ConversionRecorder;
use crate::error::StatsError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the statistics document
pub const STATS_FILE_NAME: &str = "stats.json";

/// Folder created under the user's documents directory
pub const STATS_DIR_NAME: &str = "AltesseTools";

/// Handle to the statistics file.
pub struct StatsStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl StatsStore {
    /// Use the statistics file at `path`. Nothing is read until needed.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// `<Documents>/AltesseTools/stats.json`, or `./stats.json` when there
    /// is no documents directory.
    pub fn default_location() -> PathBuf {
        dirs::document_dir()
            .map(|docs| docs.join(STATS_DIR_NAME).join(STATS_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(STATS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current statistics. A missing file reads as empty statistics.
    pub fn load(&self) -> Result<UsageStats, StatsError> {
        let _guard = self.lock();
        self.read()
    }

    /// Run `mutate` on the stored statistics and persist the result.
    pub fn update<F>(&self, mutate: F) -> Result<UsageStats, StatsError>
    where
        F: FnOnce(&mut UsageStats),
    {
        let _guard = self.lock();
        let mut stats = self.read()?;
        mutate(&mut stats);
        self.write(&stats)?;
        Ok(stats)
    }

    /// Count one conversion
    pub fn record_conversion(
        &self,
        format: &str,
        original_size: u64,
        final_size: u64,
    ) -> Result<(), StatsError> {
        self.update(|stats| stats.record(format, original_size, final_size))?;
        debug!(format, original_size, final_size, "conversion recorded");
        Ok(())
    }

    pub fn summary(&self) -> Result<StatsSummary, StatsError> {
        Ok(self.load()?.summary())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read(&self) -> Result<UsageStats, StatsError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UsageStats::default()),
            Err(source) => {
                return Err(StatsError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| StatsError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, stats: &UsageStats) -> Result<(), StatsError> {
        let write_error = |source| StatsError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_error)?;

        let json = serde_json::to_vec_pretty(stats).map_err(StatsError::Serialize)?;

        let mut file = NamedTempFile::new_in(&dir).map_err(write_error)?;
        file.write_all(&json).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path)
            .map_err(|e| write_error(e.error))?;

        Ok(())
    }
}

impl ConversionRecorder for StatsStore {
    fn record_conversion(
        &self,
        format: &str,
        original_size: u64,
        final_size: u64,
    ) -> Result<(), StatsError> {
        StatsStore::record_conversion(self, format, original_size, final_size)
    }
}
