//! Directory walking and streaming hashing for dirlisthash.
//!
//! This crate turns a root directory into a stream of inventory records.
//!
//! - **Deterministic traversal** via jwalk in serial, sorted mode
//! - **Single-pass hashing** of SHA1 and MD5 with bounded memory
//! - **Optional hashing pool** via rayon, order preserved
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use dirlisthash_scan::{HashMode, RunConfig, Walker};
//!
//! let config = RunConfig::new("/path/to/scan").with_hash_mode(HashMode::Sha1);
//! let walker = Walker::new(&config).unwrap();
//! let mut walk = walker.walk().unwrap();
//!
//! for record in walk.by_ref() {
//!     println!("{} {:?}", record.full_path.display(), record.sha1());
//! }
//!
//! let summary = walk.finish();
//! println!("{} files, {} warnings", summary.files, summary.warning_count());
//! ```

mod hasher;
mod metadata;
mod progress;
mod walker;

pub use hasher::HashEngine;
pub use metadata::{EntryMetadata, FsKind, read_metadata};
pub use progress::WalkProgress;
pub use walker::{Walk, Walker};

// Re-export core types for convenience
pub use dirlisthash_core::{
    Digests, EntryError, EntryType, HashAlgorithm, HashMode, Record, RunConfig, RunSummary,
    ScanWarning, Timestamps, WalkError, WarningKind,
};
