//! Sink error types.

use std::path::{Path, PathBuf};

use dirlisthash_core::OutputFormat;
use thiserror::Error;

/// Underlying cause of a sink failure.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Existing destination is incompatible with the record layout.
    #[error("Incompatible schema: {0}")]
    Schema(String),
}

/// Errors raised while opening, writing or closing a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination could not be opened or prepared.
    #[error("Cannot open {format} output {}: {source}", destination.display())]
    Unavailable {
        format: OutputFormat,
        destination: PathBuf,
        #[source]
        source: BackendError,
    },

    /// A record could not be persisted.
    #[error("Failed writing {format} output {}: {source}", destination.display())]
    Write {
        format: OutputFormat,
        destination: PathBuf,
        #[source]
        source: BackendError,
    },

    /// Final flush or commit failed.
    #[error("Failed closing {format} output {}: {source}", destination.display())]
    Close {
        format: OutputFormat,
        destination: PathBuf,
        #[source]
        source: BackendError,
    },

    /// Several sinks failed.
    #[error("{} outputs failed", .0.len())]
    Multiple(Vec<SinkError>),
}

impl SinkError {
    pub fn unavailable(
        format: OutputFormat,
        destination: &Path,
        source: impl Into<BackendError>,
    ) -> Self {
        Self::Unavailable {
            format,
            destination: destination.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn write(format: OutputFormat, destination: &Path, source: impl Into<BackendError>) -> Self {
        Self::Write {
            format,
            destination: destination.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn close(format: OutputFormat, destination: &Path, source: impl Into<BackendError>) -> Self {
        Self::Close {
            format,
            destination: destination.to_path_buf(),
            source: source.into(),
        }
    }

    /// Collapse a list of failures: none, the single one, or `Multiple`.
    pub fn from_many(mut errors: Vec<SinkError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Flatten into individual failures.
    pub fn into_failures(self) -> Vec<SinkError> {
        match self {
            Self::Multiple(errors) => errors.into_iter().flat_map(Self::into_failures).collect(),
            other => vec![other],
        }
    }

    /// Destination of a single failure; `None` for `Multiple`.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Unavailable { destination, .. }
            | Self::Write { destination, .. }
            | Self::Close { destination, .. } => Some(destination),
            Self::Multiple(_) => None,
        }
    }

    /// Check if this is an open failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
