//! Two-level fan-out: backends, then workers per backend.

use crate::plan::{RoundPlan, RoundSchedule};
use crate::report::{BackendReport, RoundReport, RunReport};
use crate::task_group::TaskGroup;
use crate::worker::WorkerTask;
use crate::writer::BatchWriter;
use loadgen_core::{BackendId, ConnectionProvider, Dialect, LoadError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs round plans against a set of backends.
pub struct LoadOrchestrator {
    provider: Arc<dyn ConnectionProvider>,
    dialects: HashMap<BackendId, Dialect>,
}

impl LoadOrchestrator {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        dialects: HashMap<BackendId, Dialect>,
    ) -> Self {
        Self { provider, dialects }
    }

    /// Run every round of `schedule`, stopping at the first failure.
    pub async fn run(&self, schedule: &RoundSchedule) -> Result<RunReport, LoadError> {
        self.run_with_cancellation(schedule, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but stops with [`LoadError::Cancelled`] once `cancel` fires.
    pub async fn run_with_cancellation(
        &self,
        schedule: &RoundSchedule,
        cancel: CancellationToken,
    ) -> Result<RunReport, LoadError> {
        let mut report = RunReport::default();

        for (round, plan) in schedule.iter() {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            if schedule.rounds > 1 {
                info!(
                    "Round {}/{}: {} backends x {} workers x {} rows",
                    round,
                    schedule.rounds,
                    plan.backends.len(),
                    plan.workers_per_backend,
                    plan.rows_per_worker
                );
            }
            let round_report = self.run_round(round, &plan, &cancel).await?;
            report.rounds.push(round_report);
        }

        if schedule.rounds > 1 {
            info!(
                "All {} rounds complete: {} records inserted in {:?}",
                schedule.rounds,
                report.total_rows(),
                report.elapsed()
            );
        }

        Ok(report)
    }

    /// Run a single round and join both levels.
    ///
    /// Returns a report only when every worker of every backend succeeded.
    pub async fn run_round(
        &self,
        round: u32,
        plan: &RoundPlan,
        cancel: &CancellationToken,
    ) -> Result<RoundReport, LoadError> {
        let start = Instant::now();

        let mut writers = Vec::with_capacity(plan.backends.len());
        for backend in &plan.backends {
            let dialect = self.dialects.get(backend).ok_or_else(|| {
                LoadError::InvalidPlan(format!("no dialect known for backend '{backend}'"))
            })?;
            writers.push(Arc::new(BatchWriter::new(*dialect)));
        }

        let mut backends = TaskGroup::new(format!("round {round}"), cancel.child_token());
        for (backend, writer) in plan.backends.iter().zip(writers) {
            let backend_cancel = backends.cancellation().child_token();
            backends.spawn(run_backend(
                backend.clone(),
                plan.workers_per_backend,
                plan.rows_per_worker,
                Arc::clone(&self.provider),
                writer,
                backend_cancel,
            ));
        }

        let mut reports = backends.join().await?;
        reports.sort_by_key(|r| plan.backends.iter().position(|b| *b == r.backend));

        let total_rows = reports.iter().map(|r| r.rows).sum();
        let report = RoundReport {
            round,
            backends: reports,
            total_rows,
            elapsed: start.elapsed(),
        };

        info!(
            "Round {} complete: {} records inserted in {:?} ({:.2} rows/sec)",
            round,
            report.total_rows,
            report.elapsed,
            report.rows_per_second()
        );

        Ok(report)
    }
}

/// Backend task: spawn the workers, wait for all of them, report the backend's count.
async fn run_backend(
    backend: BackendId,
    workers: usize,
    rows_per_worker: u64,
    provider: Arc<dyn ConnectionProvider>,
    writer: Arc<BatchWriter>,
    cancel: CancellationToken,
) -> Result<BackendReport, LoadError> {
    let mut group = TaskGroup::new(format!("backend {backend}"), cancel);

    for index in 0..workers {
        let task = WorkerTask {
            backend: backend.clone(),
            index,
            rows_to_write: rows_per_worker,
        };
        let worker_cancel = group.cancellation().clone();
        group.spawn(task.run(Arc::clone(&provider), Arc::clone(&writer), worker_cancel));
    }

    let worker_reports = group.join().await?;
    let report = BackendReport::from_workers(backend, &worker_reports);
    info!("{} records inserted to {}", report.rows, report.backend);

    Ok(report)
}
