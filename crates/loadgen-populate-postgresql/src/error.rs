//! Error types for the PostgreSQL backend.

use thiserror::Error;

/// Errors raised while talking to PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgreSQLBackendError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// The background connection task ended abnormally.
    #[error("Connection error: {0}")]
    Connection(String),
}
