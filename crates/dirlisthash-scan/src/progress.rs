//! Walk progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Progress snapshot sent after each emitted entry.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// File records emitted so far.
    pub files: u64,
    /// Directory records emitted so far.
    pub directories: u64,
    /// Bytes of file content inventoried so far.
    pub bytes: u64,
    /// Warnings recorded so far.
    pub warnings: u64,
    /// Path of the entry just emitted.
    pub current_path: PathBuf,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items emitted (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files + self.directories
    }
}

/// Running counters behind the snapshots.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files: u64,
    directories: u64,
    bytes: u64,
    warnings: u64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files: 0,
            directories: 0,
            bytes: 0,
            warnings: 0,
        }
    }

    pub fn record_file(&mut self, size: u64) {
        self.files += 1;
        self.bytes += size;
    }

    pub fn record_dir(&mut self) {
        self.directories += 1;
    }

    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, current_path: &Path) -> WalkProgress {
        WalkProgress {
            files: self.files,
            directories: self.directories,
            bytes: self.bytes,
            warnings: self.warnings,
            current_path: current_path.to_path_buf(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
