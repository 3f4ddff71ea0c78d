//! Flat row layout shared by every sink.

use std::ffi::OsStr;

use dirlisthash_core::{Record, format_timestamp};
use serde::{Serialize, Serializer};

/// Column names, in output order.
pub const COLUMNS: [&str; 9] = [
    "type",
    "full_path",
    "name",
    "size_bytes",
    "sha1",
    "md5",
    "created_at",
    "modified_at",
    "accessed_at",
];

/// A path or name cell kept byte-exact.
///
/// Names that are not valid UTF-8 are carried as their raw bytes instead of
/// a lossy rendering, so two distinct paths never map to the same cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathText {
    Text(String),
    Bytes(Vec<u8>),
}

impl PathText {
    pub fn from_os(value: &OsStr) -> Self {
        match value.to_str() {
            Some(text) => Self::Text(text.to_owned()),
            None => Self::Bytes(value.as_encoded_bytes().to_vec()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Whether the cell holds a name that is not valid UTF-8.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }
}

impl PartialEq<&str> for PathText {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Serialize for PathText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Bytes(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

/// One record flattened to text cells. Absent values stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub full_path: PathText,
    pub name: PathText,
    pub size_bytes: u64,
    pub sha1: Option<String>,
    pub md5: Option<String>,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub accessed_at: Option<String>,
}

impl From<&Record> for Row {
    fn from(record: &Record) -> Self {
        let ts = &record.timestamps;
        Self {
            entry_type: if record.is_dir() { "Directory" } else { "File" },
            full_path: PathText::from_os(record.full_path.as_os_str()),
            name: record
                .full_path
                .file_name()
                .map(PathText::from_os)
                .unwrap_or_else(|| PathText::Text(record.name.to_string())),
            size_bytes: record.size_bytes,
            sha1: record.digests.sha1.clone(),
            md5: record.digests.md5.clone(),
            created_at: ts.created.as_ref().map(format_timestamp),
            modified_at: ts.modified.as_ref().map(format_timestamp),
            accessed_at: ts.accessed.as_ref().map(format_timestamp),
        }
    }
}
