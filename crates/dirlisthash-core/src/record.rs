//! Inventory record types.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::config::HashAlgorithm;

/// Format bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Render a timestamp the way every sink stores it: RFC 3339, UTC, `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Type of an inventoried entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum EntryType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl EntryType {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryType::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryType::File)
    }
}

/// Filesystem timestamps, normalized to UTC.
///
/// A value the platform does not report (for example birth time on
/// filesystems without it) is `None`, never a substitute from another field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Creation (birth) time.
    pub created: Option<DateTime<Utc>>,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Last access time.
    pub accessed: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Build timestamps from raw platform values.
    pub fn from_system(
        created: Option<SystemTime>,
        modified: Option<SystemTime>,
        accessed: Option<SystemTime>,
    ) -> Self {
        Self {
            created: created.map(DateTime::<Utc>::from),
            modified: modified.map(DateTime::<Utc>::from),
            accessed: accessed.map(DateTime::<Utc>::from),
        }
    }
}

/// Content digests computed for a file, lowercase hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digests {
    /// SHA1 digest (40 hex chars).
    pub sha1: Option<String>,
    /// MD5 digest (32 hex chars).
    pub md5: Option<String>,
}

impl Digests {
    /// Get the digest for one algorithm.
    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&str> {
        match algorithm {
            HashAlgorithm::Sha1 => self.sha1.as_deref(),
            HashAlgorithm::Md5 => self.md5.as_deref(),
        }
    }

    /// Store the digest for one algorithm.
    pub fn set(&mut self, algorithm: HashAlgorithm, hex: String) {
        match algorithm {
            HashAlgorithm::Sha1 => self.sha1 = Some(hex),
            HashAlgorithm::Md5 => self.md5 = Some(hex),
        }
    }

    /// Check if no digest is present.
    pub fn is_empty(&self) -> bool {
        self.sha1.is_none() && self.md5.is_none()
    }
}

/// One inventoried file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Entry type.
    pub entry_type: EntryType,

    /// Absolute, normalized path.
    pub full_path: PathBuf,

    /// Final path component.
    pub name: CompactString,

    /// Size in bytes (always 0 for directories).
    pub size_bytes: u64,

    /// Content digests (always empty for directories).
    pub digests: Digests,

    /// Filesystem timestamps.
    pub timestamps: Timestamps,
}

impl Record {
    /// Create a file record.
    pub fn new_file(
        full_path: impl Into<PathBuf>,
        name: impl Into<CompactString>,
        size_bytes: u64,
        digests: Digests,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            entry_type: EntryType::File,
            full_path: full_path.into(),
            name: name.into(),
            size_bytes,
            digests,
            timestamps,
        }
    }

    /// Create a directory record. Directories carry no size and no digests.
    pub fn new_directory(
        full_path: impl Into<PathBuf>,
        name: impl Into<CompactString>,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            entry_type: EntryType::Directory,
            full_path: full_path.into(),
            name: name.into(),
            size_bytes: 0,
            digests: Digests::default(),
            timestamps,
        }
    }

    /// Check if this record describes a directory.
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    /// Check if this record describes a file.
    pub fn is_file(&self) -> bool {
        self.entry_type.is_file()
    }

    /// SHA1 digest, if computed.
    pub fn sha1(&self) -> Option<&str> {
        self.digests.sha1.as_deref()
    }

    /// MD5 digest, if computed.
    pub fn md5(&self) -> Option<&str> {
        self.digests.md5.as_deref()
    }
}
