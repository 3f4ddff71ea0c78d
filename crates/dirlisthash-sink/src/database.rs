//! SQLite sink.
//!
//! Rows are buffered and inserted in one transaction per batch with a
//! cached prepared statement. Re-running into the same database replaces
//! rows by `full_path`.

use std::path::{Path, PathBuf};

use dirlisthash_core::{OutputFormat, Record};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection, params};
use tracing::{debug, warn};

use crate::error::{BackendError, SinkError};
use crate::row::{PathText, Row};
use crate::sink::RecordSink;

const FORMAT: OutputFormat = OutputFormat::Database;

/// Table every run writes into.
pub const TABLE_NAME: &str = "directory_contents";

fn create_table_sql() -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
    "type" TEXT NOT NULL,
    full_path TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    sha1 TEXT,
    md5 TEXT,
    created_at TEXT,
    modified_at TEXT,
    accessed_at TEXT
)
"#
    )
}

fn insert_row_sql() -> String {
    format!(
        r#"
INSERT OR REPLACE INTO {TABLE_NAME}
    ("type", full_path, name, size_bytes, sha1, md5, created_at, modified_at, accessed_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#
    )
}

/// UTF-8 names bind as TEXT, anything else as a BLOB of the raw bytes.
impl ToSql for PathText {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            PathText::Text(text) => ToSqlOutput::from(text.as_str()),
            PathText::Bytes(bytes) => ToSqlOutput::from(bytes.as_slice()),
        })
    }
}

/// Persists records into the [`TABLE_NAME`] table.
pub struct DatabaseSink {
    path: PathBuf,
    conn: Option<Connection>,
    insert_sql: String,
    buffer: Vec<Row>,
    batch_size: usize,
    rows: u64,
    batches: u64,
}

impl DatabaseSink {
    /// Open or create the database and ensure the table exists.
    ///
    /// An existing table whose columns do not match is rejected here,
    /// before any record is written.
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| SinkError::unavailable(FORMAT, path, e))?;

        conn.execute_batch(&create_table_sql())
            .map_err(|e| SinkError::unavailable(FORMAT, path, e))?;

        let insert_sql = insert_row_sql();
        conn.prepare_cached(&insert_sql).map_err(|e| {
            SinkError::unavailable(FORMAT, path, BackendError::Schema(e.to_string()))
        })?;

        debug!(path = %path.display(), batch_size, "opened database output");

        let batch_size = batch_size.max(1);
        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
            insert_sql,
            buffer: Vec::with_capacity(batch_size.min(4096)),
            batch_size,
            rows: 0,
            batches: 0,
        })
    }

    /// Rows committed so far.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Transactions committed so far.
    pub fn batches_committed(&self) -> u64 {
        self.batches
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        let Some(conn) = self.conn.as_ref() else {
            return Err(std::io::Error::other("sink already closed").into());
        };
        let count = flush_rows(conn, &self.insert_sql, &mut self.buffer)?;
        if count > 0 {
            self.rows += count;
            self.batches += 1;
        }
        Ok(())
    }
}

/// Insert and clear buffered rows in a single transaction.
fn flush_rows(
    conn: &Connection,
    insert_sql: &str,
    buffer: &mut Vec<Row>,
) -> Result<u64, rusqlite::Error> {
    if buffer.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    let mut count = 0u64;
    {
        let mut stmt = tx.prepare_cached(insert_sql)?;
        for row in buffer.drain(..) {
            stmt.execute(params![
                row.entry_type,
                row.full_path,
                row.name,
                i64::try_from(row.size_bytes).unwrap_or(i64::MAX),
                row.sha1,
                row.md5,
                row.created_at,
                row.modified_at,
                row.accessed_at,
            ])?;
            count += 1;
        }
    }
    tx.commit()?;
    Ok(count)
}

impl RecordSink for DatabaseSink {
    fn format(&self) -> OutputFormat {
        FORMAT
    }

    fn destination(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.conn.is_none() {
            return Err(SinkError::write(
                FORMAT,
                &self.path,
                std::io::Error::other("sink already closed"),
            ));
        }

        self.buffer.push(Row::from(record));
        if self.buffer.len() >= self.batch_size {
            self.flush()
                .map_err(|e| SinkError::write(FORMAT, &self.path, e))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.conn.is_none() {
            return Ok(());
        }

        let flushed = self.flush();
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        // Rows that failed to commit are dropped with the connection.
        self.buffer.clear();
        flushed.map_err(|e| SinkError::close(FORMAT, &self.path, e))?;

        conn.close()
            .map_err(|(_, e)| SinkError::close(FORMAT, &self.path, e))?;

        debug!(
            path = %self.path.display(),
            rows = self.rows,
            batches = self.batches,
            "closed database output"
        );
        Ok(())
    }
}

impl Drop for DatabaseSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
