//! Entry metadata extraction.

use std::fs::Metadata;
use std::path::Path;

use dirlisthash_core::{EntryError, Timestamps};

/// Filesystem classification of an entry, as reported by lstat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, devices.
    Other,
}

/// Type, size and timestamps of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: FsKind,
    /// File length; 0 for everything except regular files.
    pub size_bytes: u64,
    pub timestamps: Timestamps,
}

impl EntryMetadata {
    /// Classify and extract from already-loaded metadata.
    pub fn from_fs(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            FsKind::Symlink
        } else if file_type.is_dir() {
            FsKind::Directory
        } else if file_type.is_file() {
            FsKind::File
        } else {
            FsKind::Other
        };

        let size_bytes = match kind {
            FsKind::File => metadata.len(),
            _ => 0,
        };

        // created() fails where the platform has no birth time; that stays None.
        let timestamps = Timestamps::from_system(
            metadata.created().ok(),
            metadata.modified().ok(),
            metadata.accessed().ok(),
        );

        Self {
            kind,
            size_bytes,
            timestamps,
        }
    }
}

/// Read metadata for a path without following symbolic links.
pub fn read_metadata(path: &Path) -> Result<EntryMetadata, EntryError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|source| EntryError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(EntryMetadata::from_fs(&metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, "hi").unwrap();

        let meta = read_metadata(&path).unwrap();
        assert_eq!(meta.kind, FsKind::File);
        assert_eq!(meta.size_bytes, 2);
        assert!(meta.timestamps.modified.is_some());
        assert!(meta.timestamps.accessed.is_some());
    }

    #[test]
    fn test_directory_metadata_has_zero_size() {
        let temp = TempDir::new().unwrap();
        let meta = read_metadata(temp.path()).unwrap();
        assert_eq!(meta.kind, FsKind::Directory);
        assert_eq!(meta.size_bytes, 0);
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let err = read_metadata(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, EntryError::Metadata { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_not_followed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "data").unwrap();
        std::os::unix::fs::symlink(temp.path().join("target.txt"), temp.path().join("link"))
            .unwrap();

        let meta = read_metadata(&temp.path().join("link")).unwrap();
        assert_eq!(meta.kind, FsKind::Symlink);
        assert_eq!(meta.size_bytes, 0);
    }
}
