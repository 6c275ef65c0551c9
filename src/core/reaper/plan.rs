//! Which files to keep and which to delete.

use crate::core::duplicates::DuplicateSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Keepers and deletion targets derived from a [`DuplicateSet`].
///
/// The first path of every group is kept. A path appears at most once in
/// `targets`, and never if it is a keeper of some group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapPlan {
    pub keepers: Vec<PathBuf>,
    pub targets: Vec<PathBuf>,
}

impl ReapPlan {
    pub fn from_set(set: &DuplicateSet) -> Self {
        let keepers: Vec<PathBuf> = set
            .iter()
            .filter_map(|(_, paths)| paths.first().cloned())
            .collect();

        let protected: HashSet<&Path> = keepers.iter().map(PathBuf::as_path).collect();
        let mut scheduled: HashSet<&Path> = HashSet::new();
        let mut targets = Vec::new();

        for (_, paths) in set.iter() {
            for path in paths.iter().skip(1) {
                if protected.contains(path.as_path()) || !scheduled.insert(path.as_path()) {
                    continue;
                }
                targets.push(path.clone());
            }
        }

        Self { keepers, targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Sum of target sizes on disk. Files that can no longer be read count as 0.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.targets
            .iter()
            .filter_map(|path| std::fs::metadata(path).ok())
            .map(|metadata| metadata.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(digest: &str, paths: &[&str]) -> (String, Vec<PathBuf>) {
        (
            digest.to_string(),
            paths.iter().map(PathBuf::from).collect(),
        )
    }

    #[test]
    fn keeps_first_path_of_each_group() {
        let set = DuplicateSet::from_groups([
            group("a", &["/1", "/2", "/3"]),
            group("b", &["/4", "/5"]),
        ]);

        let plan = ReapPlan::from_set(&set);

        assert_eq!(plan.keepers, vec![PathBuf::from("/1"), PathBuf::from("/4")]);
        assert_eq!(plan.targets.len(), 3);
        assert!(plan.targets.contains(&PathBuf::from("/2")));
        assert!(plan.targets.contains(&PathBuf::from("/3")));
        assert!(plan.targets.contains(&PathBuf::from("/5")));
    }

    #[test]
    fn empty_set_has_no_targets() {
        let plan = ReapPlan::from_set(&DuplicateSet::default());
        assert!(plan.is_empty());
        assert!(plan.keepers.is_empty());
    }

    #[test]
    fn never_schedules_a_path_twice() {
        let set = DuplicateSet::from_groups([
            group("a", &["/keep-a", "/shared"]),
            group("b", &["/keep-b", "/shared"]),
        ]);

        let plan = ReapPlan::from_set(&set);
        assert_eq!(plan.targets, vec![PathBuf::from("/shared")]);
    }

    #[test]
    fn never_targets_a_keeper() {
        let set = DuplicateSet::from_groups([
            group("a", &["/x", "/y"]),
            group("b", &["/y", "/z"]),
        ]);

        let plan = ReapPlan::from_set(&set);
        assert!(!plan.targets.contains(&PathBuf::from("/y")));
        assert_eq!(plan.targets, vec![PathBuf::from("/z")]);
    }
}
