//! Delimited text sink.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use dirlisthash_core::{OutputFormat, Record};
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::row::{COLUMNS, Row};
use crate::sink::RecordSink;

const FORMAT: OutputFormat = OutputFormat::Tabular;

/// Writes one delimited row per record under a fixed header.
///
/// An existing file at the destination is truncated.
pub struct TabularSink {
    path: PathBuf,
    writer: Option<Writer<File>>,
    rows: u64,
}

impl TabularSink {
    /// Create the file and write the header row.
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_path(path)
            .map_err(|e| SinkError::unavailable(FORMAT, path, e))?;

        writer
            .write_record(COLUMNS)
            .map_err(|e| SinkError::unavailable(FORMAT, path, e))?;
        writer
            .flush()
            .map_err(|e| SinkError::unavailable(FORMAT, path, e))?;

        debug!(path = %path.display(), "opened tabular output");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Rows written so far, header excluded.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

impl RecordSink for TabularSink {
    fn format(&self) -> OutputFormat {
        FORMAT
    }

    fn destination(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(SinkError::write(
                FORMAT,
                &self.path,
                std::io::Error::other("sink already closed"),
            ));
        };

        writer
            .serialize(Row::from(record))
            .map_err(|e| SinkError::write(FORMAT, &self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        writer
            .flush()
            .map_err(|e| SinkError::close(FORMAT, &self.path, e))?;

        debug!(path = %self.path.display(), rows = self.rows, "closed tabular output");
        Ok(())
    }
}

impl Drop for TabularSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
