//! Sequential row writer.

use loadgen_core::{BoxError, Connection, Dialect, USER_TABLE};
use thiserror::Error;
use tracing::trace;

const COLUMNS: [&str; 2] = ["name", "address"];

/// A write that failed at `row` (zero-based index within the batch).
#[derive(Error, Debug)]
#[error("row {row}: {source}")]
pub struct BatchError {
    pub row: u64,
    #[source]
    pub source: BoxError,
}

/// `(name, address)` for the row at `index`.
pub fn row_values(index: u64) -> (String, String) {
    (format!("User_{index}"), format!("Address_{index}"))
}

/// Writes synthetic users one INSERT at a time on a single connection.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    sql: String,
}

impl BatchWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            sql: dialect.insert_statement(USER_TABLE, &COLUMNS),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Insert rows `0..count` in order and return how many were written.
    ///
    /// Stops at the first failing row; nothing after it is attempted.
    pub async fn write_batch(
        &self,
        conn: &mut dyn Connection,
        count: u64,
    ) -> Result<u64, BatchError> {
        for row in 0..count {
            let (name, address) = row_values(row);
            conn.execute(&self.sql, &[name.as_str(), address.as_str()])
                .await
                .map_err(|source| BatchError { row, source })?;
            trace!("Inserted {}", name);
        }
        Ok(count)
    }
}
