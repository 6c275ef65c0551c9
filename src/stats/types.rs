//! Types for the usage statistics file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bytes on a 700 MB CD
pub const CD_BYTES: u64 = 700 * 1024 * 1024;

/// Bytes on a 1.44 MB floppy disk
pub const FLOPPY_BYTES: u64 = 1_474_560;

/// Totals for one output format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatStats {
    /// Number of files converted to this format
    pub count: u64,
    /// Total size before conversion
    pub original_size: u64,
    /// Total size after conversion
    pub final_size: u64,
}

impl FormatStats {
    /// Bytes saved; growth counts as zero
    pub fn saved(&self) -> u64 {
        self.original_size.saturating_sub(self.final_size)
    }
}

/// Contents of `stats.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub total_converted: u64,
    #[serde(default)]
    pub formats: BTreeMap<String, FormatStats>,
    /// Savings expressed in CDs (whole discs only)
    #[serde(default)]
    pub total_saved_cd: u64,
    /// Savings expressed in floppy disks (whole disks only)
    #[serde(default)]
    pub total_saved_floppy: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UsageStats {
    /// Count one conversion and refresh the derived totals
    pub fn record(&mut self, format: &str, original_size: u64, final_size: u64) {
        self.total_converted += 1;

        let entry = self.formats.entry(format.to_string()).or_default();
        entry.count += 1;
        entry.original_size += original_size;
        entry.final_size += final_size;

        let saved = self.total_saved();
        self.total_saved_cd = saved / CD_BYTES;
        self.total_saved_floppy = saved / FLOPPY_BYTES;
        self.updated_at = Some(Utc::now());
    }

    /// Sum of (original - final) across formats
    pub fn total_saved(&self) -> u64 {
        self.formats.values().map(FormatStats::saved).sum()
    }

    /// `(original, compressed)` byte totals across formats
    pub fn total_sizes(&self) -> (u64, u64) {
        self.formats.values().fold((0, 0), |(original, compressed), f| {
            (original + f.original_size, compressed + f.final_size)
        })
    }

    pub fn summary(&self) -> StatsSummary {
        let (total_original_size, total_compressed_size) = self.total_sizes();
        StatsSummary {
            total_converted: self.total_converted,
            formats: self.formats.clone(),
            total_saved_cd: self.total_saved_cd,
            total_saved_floppy: self.total_saved_floppy,
            total_original_size,
            total_compressed_size,
        }
    }
}

/// Statistics as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_converted: u64,
    pub formats: BTreeMap<String, FormatStats>,
    pub total_saved_cd: u64,
    pub total_saved_floppy: u64,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_per_format() {
        let mut stats = UsageStats::default();
        stats.record("webp", 1000, 400);
        stats.record("webp", 500, 100);
        stats.record("png", 10, 20);

        assert_eq!(stats.total_converted, 3);
        assert_eq!(
            stats.formats["webp"],
            FormatStats {
                count: 2,
                original_size: 1500,
                final_size: 500
            }
        );
        assert_eq!(stats.total_saved(), 1000);
        assert_eq!(stats.total_sizes(), (1510, 520));
    }

    #[test]
    fn savings_use_whole_media_only() {
        let mut stats = UsageStats::default();
        stats.record("jpeg", FLOPPY_BYTES * 3 + 5, 5);
        assert_eq!(stats.total_saved_floppy, 3);
        assert_eq!(stats.total_saved_cd, 0);

        stats.record("jpeg", CD_BYTES, 0);
        assert_eq!(stats.total_saved_cd, 1);
    }

    #[test]
    fn reads_files_without_optional_fields() {
        let json = r#"{"total_converted":2,"formats":{"png":{"count":2,"original_size":10,"final_size":4}}}"#;
        let stats: UsageStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_converted, 2);
        assert_eq!(stats.total_saved_cd, 0);
        assert!(stats.updated_at.is_none());
    }
}
