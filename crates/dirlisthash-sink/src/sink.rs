//! The sink trait and sink selection.

use std::path::Path;

use dirlisthash_core::{OutputFormat, OutputTarget, Record, RunConfig};

use crate::database::DatabaseSink;
use crate::error::SinkError;
use crate::tabular::TabularSink;

/// A persistence destination for the record stream.
///
/// `close` is idempotent. Implementations also close on drop, ignoring
/// errors, so a destination is flushed on every exit path.
pub trait RecordSink: Send {
    /// Output format of this sink.
    fn format(&self) -> OutputFormat;

    /// Destination path.
    fn destination(&self) -> &Path;

    /// Persist one record.
    fn write(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Flush and release the destination.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Open the sink for one output target.
pub fn open_sink(
    target: &OutputTarget,
    config: &RunConfig,
) -> Result<Box<dyn RecordSink>, SinkError> {
    let sink: Box<dyn RecordSink> = match target.format {
        OutputFormat::Tabular => Box::new(TabularSink::open(&target.path, config.delimiter)?),
        OutputFormat::Database => Box::new(DatabaseSink::open(&target.path, config.batch_size)?),
    };
    Ok(sink)
}
