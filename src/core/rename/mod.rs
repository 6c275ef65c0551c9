//! # Rename Module
//!
//! Batch renaming of files and folders in place.
//!
//! A name is built for every input from [`RenameOptions`], the original
//! extension is kept, and the entries are renamed one after another in input
//! order. The first failure stops the batch; earlier renames stay.
//!
//! ## Naming rules
//! - `new_name` set: one input becomes `new_name`, several become
//!   `new_name_000`, `new_name_001`, ... (`padding` defaults to 3)
//! - `start_number` set: `prefix` + zero-filled number, the old stem is dropped
//! - otherwise: `replace` → `with` on the stem, then `prefix` + stem + `suffix`
//!
//! ## Example
//! ```rust,ignore
//! use altesse_tools::core::rename::{BatchRenamer, RenameOptions};
//!
//! let renamer = BatchRenamer::new(RenameOptions::new().with_new_name("holiday"));
//! let renamed = renamer.rename(&paths)?;
//! ```

use crate::error::RenameError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Padding used for `new_name` numbering when none is given
pub const DEFAULT_PADDING: usize = 3;

/// How to build the new names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    /// Replaces the whole stem; empty means unset
    pub new_name: String,
    pub prefix: String,
    pub suffix: String,
    /// Text to replace in the stem; empty means no replacement
    pub replace: String,
    pub with: String,
    /// First number of the sequence. `None` disables prefix numbering
    pub start_number: Option<u32>,
    /// Minimum digits of the number, zero-filled
    pub padding: usize,
}

impl RenameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_name(mut self, name: impl Into<String>) -> Self {
        self.new_name = name.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_replace(mut self, replace: impl Into<String>, with: impl Into<String>) -> Self {
        self.replace = replace.into();
        self.with = with.into();
        self
    }

    pub fn with_numbering(mut self, start: u32, padding: usize) -> Self {
        self.start_number = Some(start);
        self.padding = padding;
        self
    }

    /// New stem for item `index` of a batch of `total`
    fn stem(&self, stem: &str, index: usize, total: usize) -> String {
        let number = self.start_number.unwrap_or(0) as usize + index;

        if !self.new_name.is_empty() {
            if total == 1 {
                return self.new_name.clone();
            }
            let padding = if self.padding == 0 {
                DEFAULT_PADDING
            } else {
                self.padding
            };
            return format!("{}_{:0width$}", self.new_name, number, width = padding);
        }

        if self.start_number.is_some() {
            return format!("{}{:0width$}", self.prefix, number, width = self.padding);
        }

        let stem = if self.replace.is_empty() {
            stem.to_string()
        } else {
            stem.replace(&self.replace, &self.with)
        };
        format!("{}{}{}", self.prefix, stem, self.suffix)
    }
}

/// Renames batches of paths in place.
pub struct BatchRenamer {
    options: RenameOptions,
}

impl BatchRenamer {
    pub fn new(options: RenameOptions) -> Self {
        Self { options }
    }

    /// New path for every input, in input order. Touches nothing on disk.
    pub fn plan<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>, RenameError> {
        paths
            .iter()
            .enumerate()
            .map(|(index, path)| self.target(path.as_ref(), index, paths.len()))
            .collect()
    }

    /// Rename every input and return the new paths in input order.
    ///
    /// An existing destination is never overwritten.
    pub fn rename<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>, RenameError> {
        info!(files = paths.len(), "rename started");
        let mut renamed = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let target = self.target(path, index, paths.len())?;

            if target != path && fs::symlink_metadata(&target).is_ok() {
                return Err(RenameError::Exists {
                    index,
                    path: target,
                });
            }

            fs::rename(path, &target).map_err(|source| RenameError::Rename {
                index,
                path: path.to_path_buf(),
                source,
            })?;
            debug!(from = %path.display(), to = %target.display(), "renamed");
            renamed.push(target);
        }

        info!(files = renamed.len(), "rename complete");
        Ok(renamed)
    }

    fn target(&self, path: &Path, index: usize, total: usize) -> Result<PathBuf, RenameError> {
        let invalid = || RenameError::InvalidPath {
            index,
            path: path.to_path_buf(),
        };
        let stem = path.file_stem().ok_or_else(invalid)?.to_string_lossy();

        let mut name = self.options.stem(&stem, index, total);
        if name.is_empty() {
            return Err(invalid());
        }
        if let Some(extension) = path.extension() {
            name.push('.');
            name.push_str(&extension.to_string_lossy());
        }

        Ok(path.with_file_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn new_name_numbers_several_files() {
        let renamer = BatchRenamer::new(RenameOptions::new().with_new_name("trip"));
        let planned = renamer
            .plan(&["/p/a.jpg", "/p/b.png", "/p/c"])
            .unwrap();
        assert_eq!(names(&planned), ["trip_000.jpg", "trip_001.png", "trip_002"]);
        assert_eq!(planned[0], PathBuf::from("/p/trip_000.jpg"));
    }

    #[test]
    fn new_name_alone_for_single_file() {
        let renamer = BatchRenamer::new(RenameOptions::new().with_new_name("cover"));
        assert_eq!(names(&renamer.plan(&["/p/IMG_1.jpeg"]).unwrap()), ["cover.jpeg"]);
    }

    #[test]
    fn new_name_uses_start_and_padding() {
        let options = RenameOptions::new().with_new_name("scan").with_numbering(9, 2);
        let planned = BatchRenamer::new(options).plan(&["a.tif", "b.tif"]).unwrap();
        assert_eq!(names(&planned), ["scan_09.tif", "scan_10.tif"]);
    }

    #[test]
    fn prefix_numbering_replaces_the_stem() {
        let options = RenameOptions::new().with_prefix("img").with_numbering(1, 4);
        let planned = BatchRenamer::new(options).plan(&["x.png", "y.png"]).unwrap();
        assert_eq!(names(&planned), ["img0001.png", "img0002.png"]);
    }

    #[test]
    fn replace_then_prefix_and_suffix() {
        let options = RenameOptions::new()
            .with_replace(" ", "-")
            .with_prefix("2024-")
            .with_suffix("_final");
        let planned = BatchRenamer::new(options)
            .plan(&["/docs/my holiday photo.jpg"])
            .unwrap();
        assert_eq!(names(&planned), ["2024-my-holiday-photo_final.jpg"]);
    }

    #[test]
    fn empty_result_name_is_rejected() {
        let options = RenameOptions::new().with_replace("draft", "");
        let error = BatchRenamer::new(options).plan(&["ok.txt", "draft.txt"]).unwrap_err();
        assert!(matches!(error, RenameError::InvalidPath { index: 1, .. }));
    }

    #[test]
    fn renames_files_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = vec![touch(temp_dir.path(), "b.txt"), touch(temp_dir.path(), "a.jpg")];

        let renamed = BatchRenamer::new(RenameOptions::new().with_new_name("doc"))
            .rename(&inputs)
            .unwrap();

        assert_eq!(names(&renamed), ["doc_000.txt", "doc_001.jpg"]);
        assert_eq!(fs::read_to_string(&renamed[0]).unwrap(), "b.txt");
        assert_eq!(fs::read_to_string(&renamed[1]).unwrap(), "a.jpg");
        assert!(!inputs[0].exists());
        assert!(!inputs[1].exists());
    }

    #[test]
    fn existing_destination_stops_the_batch() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = vec![touch(temp_dir.path(), "one.txt"), touch(temp_dir.path(), "two.txt")];
        let blocker = touch(temp_dir.path(), "new_001.txt");

        let error = BatchRenamer::new(RenameOptions::new().with_new_name("new"))
            .rename(&inputs)
            .unwrap_err();

        match error {
            RenameError::Exists { index, path } => {
                assert_eq!(index, 1);
                assert_eq!(path, blocker);
            }
            other => panic!("expected exists error, got {:?}", other),
        }
        assert!(temp_dir.path().join("new_000.txt").exists());
        assert!(inputs[1].exists());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "new_001.txt");
    }

    #[test]
    fn unchanged_name_is_not_a_collision() {
        let temp_dir = TempDir::new().unwrap();
        let input = touch(temp_dir.path(), "same.txt");

        let renamed = BatchRenamer::new(RenameOptions::new())
            .rename(&[&input])
            .unwrap();

        assert_eq!(renamed, [input.clone()]);
        assert!(input.exists());
    }

    #[test]
    fn missing_source_is_a_rename_error() {
        let temp_dir = TempDir::new().unwrap();
        let error = BatchRenamer::new(RenameOptions::new().with_prefix("x_"))
            .rename(&[temp_dir.path().join("gone.txt")])
            .unwrap_err();
        assert!(matches!(error, RenameError::Rename { index: 0, .. }));
    }
}
