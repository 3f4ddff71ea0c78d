//! Core types for dirlisthash.
//!
//! This crate provides the data structures shared by the scanner, the
//! output sinks and the command-line front end: inventory records, the
//! run configuration, error types and the run summary.

mod config;
mod error;
mod record;
mod summary;

pub use config::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE, HashAlgorithm, HashMode, OutputFormat, OutputTarget,
    RunConfig, RunConfigBuilder,
};
pub use error::{EntryError, ScanWarning, WalkError, WarningKind};
pub use record::{Digests, EntryType, Record, Timestamps, format_timestamp, to_hex};
pub use summary::RunSummary;
