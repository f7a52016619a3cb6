//! Entry points behind the `run-service` and `run-migration` commands.

use crate::provider::DriverProvider;
use anyhow::Context;
use loadgen_core::{apply_pending, BackendConfig, Engine, LoadError, MigrationOutcome, MigrationSet};
use loadgen_framework::{LoadOrchestrator, RoundSchedule, RunReport};
use loadgen_populate_mysql::MySQLConnection;
use loadgen_populate_postgresql::PostgreSQLConnection;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run `schedule` against `backends` until it completes, fails, or `cancel` fires.
pub async fn run_service(
    backends: &[BackendConfig],
    schedule: &RoundSchedule,
    cancel: CancellationToken,
) -> anyhow::Result<RunReport> {
    let provider = DriverProvider::new(backends);
    let dialects = provider.dialects();
    let orchestrator = LoadOrchestrator::new(Arc::new(provider), dialects);

    info!(
        "Starting load: {} round(s), {} rows planned",
        schedule.rounds,
        schedule.total_rows()
    );
    let report = orchestrator
        .run_with_cancellation(schedule, cancel)
        .await
        .context("Load run failed")?;

    info!(
        "Load complete: {} records inserted in {:?}",
        report.total_rows(),
        report.elapsed()
    );
    Ok(report)
}

/// Apply pending migrations from `migrations_dir` to each backend in order.
///
/// Stops at the first backend that fails; backends after it are left untouched.
pub async fn run_migration(
    backends: &[BackendConfig],
    migrations_dir: &Path,
) -> anyhow::Result<Vec<MigrationOutcome>> {
    let set = MigrationSet::from_dir(migrations_dir)
        .with_context(|| format!("Failed to load migrations from {migrations_dir:?}"))?;
    info!(
        "Loaded {} migration(s) from {:?}",
        set.len(),
        migrations_dir
    );

    let mut outcomes = Vec::with_capacity(backends.len());
    for backend in backends {
        let outcome = migrate_backend(backend, &set)
            .await
            .with_context(|| format!("Failed to migrate {}", backend.id))?;
        match &outcome {
            MigrationOutcome::Applied { .. } => {
                info!("{} migrations applied successfully", backend.id)
            }
            MigrationOutcome::NoChange => info!("{} migrations: no change", backend.id),
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

async fn migrate_backend(
    backend: &BackendConfig,
    set: &MigrationSet,
) -> Result<MigrationOutcome, LoadError> {
    let id = &backend.id;
    match backend.engine {
        Engine::PostgreSQL => {
            let mut conn = PostgreSQLConnection::open(backend)
                .await
                .map_err(|e| LoadError::connect(id, e))?;
            let outcome = apply_pending(id, &mut conn, set).await;
            if let Err(e) = conn.disconnect().await {
                warn!("Failed to close PostgreSQL connection to {}: {}", id, e);
            }
            outcome
        }
        Engine::MySQL => {
            let mut conn = MySQLConnection::open(backend)
                .await
                .map_err(|e| LoadError::connect(id, e))?;
            let outcome = apply_pending(id, &mut conn, set).await;
            if let Err(e) = conn.disconnect().await {
                warn!("Failed to close MySQL connection to {}: {}", id, e);
            }
            outcome
        }
    }
}
