//! Run configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Default read chunk size for hashing (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default number of rows per database transaction.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// A digest algorithm the hash engine can compute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Md5,
}

/// Which digests to compute for each file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HashMode {
    /// Metadata only, file contents are never read.
    #[default]
    None,
    Sha1,
    Md5,
    Both,
}

impl HashMode {
    /// The algorithms this mode selects, in column order.
    pub fn algorithms(&self) -> &'static [HashAlgorithm] {
        match self {
            HashMode::None => &[],
            HashMode::Sha1 => &[HashAlgorithm::Sha1],
            HashMode::Md5 => &[HashAlgorithm::Md5],
            HashMode::Both => &[HashAlgorithm::Sha1, HashAlgorithm::Md5],
        }
    }

    /// Check if no hashing is requested.
    pub fn is_none(&self) -> bool {
        matches!(self, HashMode::None)
    }
}

/// Destination format for the record stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Delimited text file with a header row.
    Tabular,
    /// SQLite database file.
    Database,
}

/// One output destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    /// Output format.
    pub format: OutputFormat,
    /// Destination file path.
    pub path: PathBuf,
}

impl OutputTarget {
    /// Create a tabular output target.
    pub fn tabular(path: impl Into<PathBuf>) -> Self {
        Self {
            format: OutputFormat::Tabular,
            path: path.into(),
        }
    }

    /// Create a database output target.
    pub fn database(path: impl Into<PathBuf>) -> Self {
        Self {
            format: OutputFormat::Database,
            path: path.into(),
        }
    }
}

/// Configuration for one inventory run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RunConfig {
    /// Root directory to inventory.
    pub root: PathBuf,

    /// Digests to compute for files.
    #[builder(default)]
    #[serde(default)]
    pub hash_mode: HashMode,

    /// Output destinations, in the order they are opened.
    #[builder(default)]
    #[serde(default)]
    pub outputs: Vec<OutputTarget>,

    /// Read chunk size for hashing, in bytes.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Hashing threads (1 = sequential pipeline, 0 = one per CPU).
    #[builder(default = "1")]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Rows per database transaction.
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Field delimiter for tabular output.
    #[builder(default = "b','")]
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_threads() -> usize {
    1
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_delimiter() -> u8 {
    b','
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be greater than zero".to_string());
        }
        if self.batch_size == Some(0) {
            return Err("Batch size must be greater than zero".to_string());
        }
        if let Some(delimiter) = self.delimiter {
            if delimiter == b'"' || delimiter == b'\n' || delimiter == b'\r' {
                return Err(format!("Invalid delimiter: {:?}", delimiter as char));
            }
        }
        Ok(())
    }
}

impl RunConfig {
    /// Create a new run config builder.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Create a metadata-only config for a root with no outputs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hash_mode: HashMode::None,
            outputs: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: b',',
        }
    }

    /// Set the hash mode.
    pub fn with_hash_mode(mut self, hash_mode: HashMode) -> Self {
        self.hash_mode = hash_mode;
        self
    }

    /// Add an output destination.
    pub fn with_output(mut self, target: OutputTarget) -> Self {
        self.outputs.push(target);
        self
    }

    /// Check if hashing runs on a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.threads != 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RunConfig::builder()
            .root("/home/user")
            .hash_mode(HashMode::Both)
            .threads(4usize)
            .outputs(vec![OutputTarget::tabular("/tmp/out.csv")])
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.hash_mode, HashMode::Both);
        assert_eq!(config.threads, 4);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.delimiter, b',');
        assert!(config.is_parallel());
    }

    #[test]
    fn test_builder_rejects_zero_chunk() {
        let err = RunConfig::builder()
            .root("/data")
            .chunk_size(0usize)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Chunk size"));
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(RunConfig::builder().build().is_err());
        assert!(RunConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_hash_mode_algorithms() {
        assert!(HashMode::None.algorithms().is_empty());
        assert_eq!(HashMode::Md5.algorithms(), &[HashAlgorithm::Md5]);
        assert_eq!(
            HashMode::Both.algorithms(),
            &[HashAlgorithm::Sha1, HashAlgorithm::Md5]
        );
    }

    #[test]
    fn test_config_simple() {
        let config = RunConfig::new("/data").with_output(OutputTarget::database("/tmp/out.db"));
        assert!(config.hash_mode.is_none());
        assert!(!config.is_parallel());
        assert_eq!(config.outputs[0].format, OutputFormat::Database);
    }
}
