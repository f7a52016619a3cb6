//! Error types for the MySQL backend.

use thiserror::Error;

/// Errors raised while talking to MySQL.
#[derive(Error, Debug)]
pub enum MySQLBackendError {
    /// MySQL connection or query error.
    #[error("MySQL error: {0}")]
    MySQL(#[from] mysql_async::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
