//! # Duplicates Module
//!
//! Data types shared by the scanner and the reaper.
//!
//! - [`DigestRecord`] - one hashed file, produced by a hashing worker
//! - [`DigestIndex`] - the collector's accumulator, digest to paths
//! - [`DuplicateSet`] - the finished report, groups with two or more paths
//!
//! Paths inside a group keep the order they were collected in. The first
//! path is the keeper when duplicates are deleted.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A file and its content digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub path: PathBuf,
    pub digest: String,
    /// File size in bytes
    pub size: u64,
}

/// Accumulates digest records while a scan is running.
#[derive(Debug, Default)]
pub struct DigestIndex {
    groups: HashMap<String, Vec<PathBuf>>,
    files: usize,
    bytes: u64,
}

impl DigestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its digest group
    pub fn insert(&mut self, record: DigestRecord) {
        self.files += 1;
        self.bytes += record.size;
        self.groups
            .entry(record.digest)
            .or_default()
            .push(record.path);
    }

    /// Number of records inserted
    pub fn files_indexed(&self) -> usize {
        self.files
    }

    /// Total bytes across all inserted records
    pub fn bytes_indexed(&self) -> u64 {
        self.bytes
    }

    /// Drop every digest seen only once
    pub fn into_duplicates(self) -> DuplicateSet {
        let groups = self
            .groups
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .collect();
        DuplicateSet { groups }
    }
}

/// Duplicate groups keyed by content digest.
///
/// Every group has at least two paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateSet {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl DuplicateSet {
    /// Build a set from an existing mapping.
    ///
    /// Groups with fewer than two paths are dropped.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<PathBuf>)>,
    {
        Self {
            groups: groups
                .into_iter()
                .filter(|(_, paths)| paths.len() > 1)
                .collect(),
        }
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Paths sharing `digest`
    pub fn get(&self, digest: &str) -> Option<&[PathBuf]> {
        self.groups.get(digest).map(Vec::as_slice)
    }

    /// Iterate `(digest, paths)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(digest, paths)| (digest.as_str(), paths.as_slice()))
    }

    /// Files that would be removed: group size minus one, summed
    pub fn duplicate_count(&self) -> usize {
        self.groups.values().map(|paths| paths.len() - 1).sum()
    }

    /// Total number of paths across all groups
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// The path that survives deletion for `digest`
    pub fn keeper(&self, digest: &str) -> Option<&Path> {
        self.groups
            .get(digest)
            .and_then(|paths| paths.first())
            .map(PathBuf::as_path)
    }

    /// Sort the paths inside each group.
    ///
    /// Collection order depends on which worker finished first; sorting
    /// makes the report (and the choice of keeper) stable across runs.
    pub fn normalized(mut self) -> Self {
        for paths in self.groups.values_mut() {
            paths.sort();
        }
        self
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<PathBuf>> {
        self.groups
    }
}

impl From<HashMap<String, Vec<PathBuf>>> for DuplicateSet {
    fn from(groups: HashMap<String, Vec<PathBuf>>) -> Self {
        Self::from_groups(groups)
    }
}
