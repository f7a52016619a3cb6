//! Traits the orchestrator writes through.

use crate::backend::BackendId;
use crate::error::{BoxError, LoadError};
use async_trait::async_trait;

/// One exclusive, already-verified connection to a backend.
///
/// A connection is owned by a single worker for its whole lifetime and is never shared.
#[async_trait]
pub trait Connection: Send {
    /// Execute one parameterized statement and return the affected row count.
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, BoxError>;

    /// Release the physical connection.
    ///
    /// Release problems are logged by the implementation; they never replace the result of the
    /// work done on the connection.
    async fn close(self: Box<Self>);
}

/// Opens connections for backends.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Open and ping a fresh connection to `backend`.
    ///
    /// Fails with [`LoadError::Connect`] when the backend is unknown, cannot be reached, or does
    /// not answer the liveness check.
    async fn acquire(&self, backend: &BackendId) -> Result<Box<dyn Connection>, LoadError>;
}
