//! Record sinks for dirlisthash.
//!
//! Every sink takes the same record stream and flattens each record to
//! the same nine columns:
//!
//! `type, full_path, name, size_bytes, sha1, md5, created_at, modified_at, accessed_at`
//!
//! - [`TabularSink`] writes delimited text through the `csv` crate
//! - [`DatabaseSink`] writes a SQLite table in batched transactions
//! - [`CompositeSink`] fans one stream out to several sinks
//!
//! Paths and names that are not valid UTF-8 are written as their raw bytes
//! (a BLOB in SQLite), never as a lossy rendering.

mod composite;
mod database;
mod error;
mod row;
mod sink;
mod tabular;

pub use composite::CompositeSink;
pub use database::{DatabaseSink, TABLE_NAME};
pub use error::{BackendError, SinkError};
pub use row::{COLUMNS, PathText, Row};
pub use sink::{RecordSink, open_sink};
pub use tabular::TabularSink;
