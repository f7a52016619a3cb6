//! The smallest unit of concurrent work: one connection, one burst of writes.

use crate::report::WorkerReport;
use crate::writer::BatchWriter;
use loadgen_core::{BackendId, ConnectionProvider, LoadError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One worker of a backend task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerTask {
    pub backend: BackendId,
    /// Zero-based position among the backend's workers.
    pub index: usize,
    pub rows_to_write: u64,
}

impl WorkerTask {
    /// Acquire a connection, write the rows, release the connection.
    ///
    /// The connection is closed on every path that opened it, including cancellation and
    /// write failure.
    pub async fn run(
        self,
        provider: Arc<dyn ConnectionProvider>,
        writer: Arc<BatchWriter>,
        cancel: CancellationToken,
    ) -> Result<WorkerReport, LoadError> {
        let mut conn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LoadError::Cancelled),
            conn = provider.acquire(&self.backend) => conn?,
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LoadError::Cancelled),
            written = writer.write_batch(conn.as_mut(), self.rows_to_write) => {
                written.map_err(|e| LoadError::Write {
                    backend: self.backend.clone(),
                    worker: self.index,
                    row: e.row,
                    source: e.source,
                })
            }
        };

        conn.close().await;

        let rows = outcome?;
        debug!(
            "Worker {} on {} inserted {} rows",
            self.index, self.backend, rows
        );

        Ok(WorkerReport {
            backend: self.backend,
            worker: self.index,
            rows,
        })
    }
}
