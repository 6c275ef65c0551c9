//! Walk → hash → collect pipeline.

use super::filter::EntryFilter;
use crate::core::duplicates::{DigestIndex, DigestRecord, DuplicateSet};
use crate::core::hasher::{ContentHasher, DigestAlgorithm};
use crate::core::parallel::{CancellationToken, PoolConfig, WorkerPool};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress, ScanSummary};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Default capacity of the walk→hash and hash→collect queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Configuration for the duplicate scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Digest used to compare file contents
    pub algorithm: DigestAlgorithm,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Files smaller than this are ignored
    pub min_size: u64,
    /// Only hash these extensions (None = every file)
    pub extensions: Option<Vec<String>>,
    /// Capacity of each bounded queue between stages
    pub queue_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            min_size: 0,
            extensions: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Builder for [`DuplicateScanner`]
#[derive(Debug, Default)]
pub struct ScannerBuilder {
    config: ScanConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the digest algorithm
    pub fn algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    pub fn min_size(mut self, bytes: u64) -> Self {
        self.config.min_size = bytes;
        self
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.extensions = Some(extensions);
        self
    }

    /// Set the capacity of the inter-stage queues (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> DuplicateScanner {
        DuplicateScanner::new(self.config)
    }
}

/// Finds files with identical content under a directory.
///
/// Walking, hashing and collecting run at the same time. A walker thread
/// feeds a bounded path queue, a pool of hashing workers (one per available
/// CPU) drains it into a bounded record queue, and the calling thread
/// collects records by digest. Full queues block their producer, so the
/// walk never runs far ahead of hashing.
///
/// Any walk or hash error aborts the whole scan: no partial report is
/// returned.
pub struct DuplicateScanner {
    config: ScanConfig,
    filter: EntryFilter,
    hasher: ContentHasher,
}

impl DuplicateScanner {
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = EntryFilter::new()
            .with_hidden(config.include_hidden)
            .with_min_size(config.min_size);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self {
            hasher: ContentHasher::new(config.algorithm),
            config,
            filter,
        }
    }

    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `root` for duplicate files
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<DuplicateSet, ScanError> {
        self.run(root.as_ref(), &null_sender(), &CancellationToken::new())
    }

    /// Scan with progress reporting via events
    pub fn scan_with_events(
        &self,
        root: impl AsRef<Path>,
        events: &EventSender,
    ) -> Result<DuplicateSet, ScanError> {
        self.run(root.as_ref(), events, &CancellationToken::new())
    }

    /// Scan until finished, failed, or `cancel` fires
    pub fn scan_with_cancel(
        &self,
        root: impl AsRef<Path>,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<DuplicateSet, ScanError> {
        self.run(root.as_ref(), events, cancel)
    }

    fn run(
        &self,
        root: &Path,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<DuplicateSet, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        let root = std::path::absolute(root).map_err(|_| ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        })?;

        let start = Instant::now();
        let pool = WorkerPool::new(PoolConfig::uncapped())?;
        info!(
            root = %root.display(),
            workers = pool.worker_count(),
            algorithm = %self.config.algorithm,
            "scan started"
        );
        events.send(Event::Scan(ScanEvent::Started { root: root.clone() }));

        let result = self.pipeline(&root, &pool, events, cancel);

        match result {
            Ok(index) => {
                let files_hashed = index.files_indexed();
                let bytes_hashed = index.bytes_indexed();
                let duplicates = index.into_duplicates();
                let summary = ScanSummary {
                    files_hashed,
                    bytes_hashed,
                    duplicate_groups: duplicates.len(),
                    duplicate_files: duplicates.duplicate_count(),
                    duration_ms: start.elapsed().as_millis() as u64,
                };
                info!(
                    files = summary.files_hashed,
                    groups = summary.duplicate_groups,
                    duplicates = summary.duplicate_files,
                    duration_ms = summary.duration_ms,
                    "scan complete"
                );
                events.send(Event::Scan(ScanEvent::Completed(summary)));
                Ok(duplicates)
            }
            Err(error) => {
                warn!(root = %root.display(), %error, "scan aborted");
                events.send(Event::Scan(ScanEvent::Failed {
                    message: error.to_string(),
                }));
                Err(error)
            }
        }
    }

    fn pipeline(
        &self,
        root: &Path,
        pool: &WorkerPool,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<DigestIndex, ScanError> {
        let capacity = self.config.queue_capacity.max(1);
        let (path_tx, path_rx) = bounded::<(PathBuf, u64)>(capacity);
        let (record_tx, record_rx) = bounded::<DigestRecord>(capacity);
        // Capacity 1: the first fatal error is kept, later ones are dropped.
        // `error_tx` stays alive here so the collector never sees it disconnect.
        let (error_tx, error_rx) = bounded::<ScanError>(1);
        let abort = CancellationToken::new();

        let stop = Stop {
            abort: &abort,
            cancel,
        };

        thread::scope(|scope| {
            let walk_errors = error_tx.clone();
            scope.spawn(move || self.walk(root, path_tx, walk_errors, stop));

            let hash_errors = error_tx.clone();
            scope.spawn(move || {
                pool.run_workers(|worker| {
                    self.hash_worker(worker, &path_rx, &record_tx, &hash_errors, stop)
                });
                drop(record_tx);
            });

            self.collect(record_rx, &error_rx, stop, events)
        })
    }

    /// Walking stage: enumerate regular files into the path queue.
    fn walk(
        &self,
        root: &Path,
        paths: Sender<(PathBuf, u64)>,
        errors: Sender<ScanError>,
        stop: Stop<'_>,
    ) {
        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || self.filter.should_visit(entry.file_name()));

        for entry in entries {
            if stop.requested() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source.path().unwrap_or(root).to_path_buf();
                    stop.fail(&errors, ScanError::Walk { path, source });
                    return;
                }
            };

            // Directories are traversed, not hashed. Unfollowed symlinks are skipped.
            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(source) => {
                    let path = entry.path().to_path_buf();
                    stop.fail(&errors, ScanError::Walk { path, source });
                    return;
                }
            };

            if !self.filter.should_include(entry.path(), size) {
                continue;
            }

            if paths.send((entry.into_path(), size)).is_err() {
                return;
            }
        }
    }

    /// Hashing stage: one of these runs on every pool thread.
    fn hash_worker(
        &self,
        worker: usize,
        paths: &Receiver<(PathBuf, u64)>,
        records: &Sender<DigestRecord>,
        errors: &Sender<ScanError>,
        stop: Stop<'_>,
    ) {
        for (path, size) in paths.iter() {
            if stop.requested() {
                return;
            }

            match self.hasher.hash_file(&path) {
                Ok(digest) => {
                    if records.send(DigestRecord { path, digest, size }).is_err() {
                        return;
                    }
                }
                Err(error) => {
                    debug!(worker, path = %path.display(), "hashing failed");
                    stop.fail(errors, error.into());
                    return;
                }
            }
        }
    }

    /// Collecting stage: runs on the calling thread until every hashing
    /// worker is done, or the first fatal error arrives.
    fn collect(
        &self,
        records: Receiver<DigestRecord>,
        errors: &Receiver<ScanError>,
        stop: Stop<'_>,
        events: &EventSender,
    ) -> Result<DigestIndex, ScanError> {
        let mut index = DigestIndex::new();

        loop {
            select! {
                recv(records) -> msg => match msg {
                    Ok(record) => {
                        events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                            files_hashed: index.files_indexed() + 1,
                            bytes_hashed: index.bytes_indexed() + record.size,
                            current_path: record.path.clone(),
                        })));
                        index.insert(record);
                    }
                    // Every hashing worker has exited.
                    Err(_) => break,
                },
                recv(errors) -> msg => {
                    if let Ok(error) = msg {
                        stop.abort.cancel();
                        return Err(error);
                    }
                },
            }
        }

        // A worker may fail right before the record queue closes.
        if let Ok(error) = errors.try_recv() {
            return Err(error);
        }
        if stop.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        Ok(index)
    }
}

/// Stop signals shared by the three stages.
#[derive(Clone, Copy)]
struct Stop<'a> {
    /// Set internally on the first fatal error
    abort: &'a CancellationToken,
    /// Set by the caller
    cancel: &'a CancellationToken,
}

impl Stop<'_> {
    fn requested(&self) -> bool {
        self.abort.is_cancelled() || self.cancel.is_cancelled()
    }

    /// Report a fatal error (first one wins) and stop every stage.
    fn fail(&self, errors: &Sender<ScanError>, error: ScanError) {
        let _ = errors.try_send(error);
        self.abort.cancel();
    }
}
