//! Entry filtering for the duplicate scanner.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

/// Decides which directory entries take part in a scan.
///
/// By default every regular file is included, hidden or not, empty or not.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Lowercase extensions to accept (None = all files)
    extensions: Option<HashSet<String>>,
    include_hidden: bool,
    min_size: u64,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self {
            extensions: None,
            include_hidden: true,
            min_size: 0,
        }
    }

    /// Include hidden files and directories (names starting with `.`)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Only accept these extensions (case-insensitive, without the dot)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    /// Skip files smaller than `bytes`
    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    /// Whether the walker should enter (or yield) an entry with this name
    pub fn should_visit(&self, name: &OsStr) -> bool {
        self.include_hidden || !is_hidden(name)
    }

    /// Whether a regular file of `size` bytes should be hashed
    pub fn should_include(&self, path: &Path, size: u64) -> bool {
        if size < self.min_size {
            return false;
        }

        if let Some(name) = path.file_name() {
            if !self.should_visit(name) {
                return false;
            }
        }

        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| allowed.contains(&e.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}
