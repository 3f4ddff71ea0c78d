//! dirlisthash - directory inventory with streaming SHA1/MD5 hashing.
//!
//! Walks a root directory deterministically and writes one record per
//! file and directory to CSV and/or SQLite.

pub mod naming;
pub mod pipeline;

pub use naming::{REPORT_PREFIX, default_report_stem};
pub use pipeline::{Inventory, RunError, RunOutcome};

pub use dirlisthash_core::{
    DEFAULT_CHUNK_SIZE, HashMode, OutputFormat, OutputTarget, Record, RunConfig, RunConfigBuilder,
    RunSummary, WarningKind,
};
pub use dirlisthash_scan::WalkProgress;
pub use dirlisthash_sink::SinkError;
