//! Run summary statistics.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScanWarning, WarningKind};
use crate::record::Record;

/// Totals for one inventory run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Root path that was walked.
    pub root: PathBuf,
    /// Number of file records emitted.
    pub files: u64,
    /// Number of directory records emitted.
    pub directories: u64,
    /// Sum of file sizes in bytes.
    pub total_bytes: u64,
    /// Number of files that received every requested digest.
    pub hashed_files: u64,
    /// Warnings in the order they occurred.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of the walk.
    pub duration: Duration,
    /// Whether the walk stopped early on user interrupt.
    pub interrupted: bool,
}

impl RunSummary {
    /// Create an empty summary for a root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Count an emitted record.
    pub fn record(&mut self, record: &Record) {
        if record.is_dir() {
            self.directories += 1;
        } else {
            self.files += 1;
            self.total_bytes += record.size_bytes;
        }
    }

    /// Count a file whose digests were all computed.
    pub fn record_hashed(&mut self) {
        self.hashed_files += 1;
    }

    /// Record a warning.
    pub fn warn(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    /// Total records emitted.
    pub fn total_records(&self) -> u64 {
        self.files + self.directories
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Entries that produced no record.
    pub fn skipped_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_skip()).count()
    }

    /// Files recorded without their digests.
    pub fn partial_count(&self) -> usize {
        self.count_of(WarningKind::HashError)
    }

    /// Number of warnings of one kind.
    pub fn count_of(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Warning counts grouped by kind.
    pub fn warnings_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for warning in &self.warnings {
            *counts.entry(warning.kind.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
