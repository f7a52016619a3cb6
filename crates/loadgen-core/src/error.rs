//! Error types shared across the fan-out.

use crate::backend::BackendId;
use thiserror::Error;

/// Driver-level error carried as the source of a [`LoadError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can end a load run or a migration.
///
/// `Connect`, `Write` and `Migration` are the fatal failure classes. The remaining variants
/// describe how the orchestration itself stopped.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A backend connection could not be opened or did not answer the liveness check.
    #[error("Connection to backend '{backend}' failed: {source}")]
    Connect {
        backend: BackendId,
        #[source]
        source: BoxError,
    },

    /// An INSERT statement failed.
    #[error("Insert failed on backend '{backend}' (worker {worker}, row {row}): {source}")]
    Write {
        backend: BackendId,
        worker: usize,
        row: u64,
        #[source]
        source: BoxError,
    },

    /// Applying schema migrations failed.
    #[error("Migration failed on backend '{backend}': {message}")]
    Migration { backend: BackendId, message: String },

    /// The task stopped because its cancellation token fired, either after a sibling failed or
    /// on an external interrupt.
    #[error("Cancelled")]
    Cancelled,

    /// A spawned task panicked.
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// The round plan cannot be executed.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoadError {
    pub fn connect(backend: &BackendId, source: impl Into<BoxError>) -> Self {
        LoadError::Connect {
            backend: backend.clone(),
            source: source.into(),
        }
    }

    pub fn migration(backend: &BackendId, message: impl Into<String>) -> Self {
        LoadError::Migration {
            backend: backend.clone(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}
