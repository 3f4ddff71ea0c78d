//! Error and warning types for inventory runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Fatal errors that stop a walk before it starts.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Root path does not exist, cannot be resolved, or is not a directory.
    #[error("Invalid root {path}: {reason}")]
    RootInvalid { path: PathBuf, reason: String },

    /// The hashing worker pool could not be created.
    #[error("Failed to build hashing thread pool: {message}")]
    ThreadPool { message: String },
}

impl WalkError {
    /// Create a root error from an I/O failure.
    pub fn root_io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::RootInvalid {
            path: path.into(),
            reason: source.to_string(),
        }
    }

    /// Create a root error for a path that is not a directory.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::RootInvalid {
            path: path.into(),
            reason: "not a directory".to_string(),
        }
    }
}

/// Recoverable failures for a single entry.
#[derive(Debug, Error)]
pub enum EntryError {
    /// Entry vanished or became inaccessible between discovery and stat.
    #[error("Metadata error at {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File contents could not be read for hashing.
    #[error("Hash error at {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EntryError {
    /// Path the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Metadata { path, .. } | Self::Hash { path, .. } => path,
        }
    }
}

/// Kind of scan warning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum WarningKind {
    /// Metadata could not be read; the entry was skipped.
    MetadataError,
    /// File could not be hashed; the entry was recorded without digests.
    HashError,
    /// Directory listing could not be read; its children are missing.
    ReadDirError,
    /// Symbolic link skipped, never followed.
    SymlinkSkipped,
    /// Socket, fifo or device skipped.
    Unsupported,
}

/// Non-fatal warning encountered during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a skipped symbolic link.
    pub fn symlink_skipped(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Symbolic link skipped: {}", path.display()),
            path,
            kind: WarningKind::SymlinkSkipped,
        }
    }

    /// Create a warning for a skipped special file.
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Special file skipped: {}", path.display()),
            path,
            kind: WarningKind::Unsupported,
        }
    }

    /// Create a warning for an unreadable directory listing.
    pub fn read_dir(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningKind::ReadDirError)
    }

    /// Check if the entry behind this warning produced no record at all.
    pub fn is_skip(&self) -> bool {
        matches!(
            self.kind,
            WarningKind::MetadataError | WarningKind::SymlinkSkipped | WarningKind::Unsupported
        )
    }
}

impl From<&EntryError> for ScanWarning {
    fn from(err: &EntryError) -> Self {
        let kind = match err {
            EntryError::Metadata { .. } => WarningKind::MetadataError,
            EntryError::Hash { .. } => WarningKind::HashError,
        };
        Self::new(err.path(), err.to_string(), kind)
    }
}
