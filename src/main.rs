//! Command-line interface for loadgen
//!
//! # Usage Examples
//!
//! ## Migrations
//! ```bash
//! # Apply migrations/*.up.sql to the default PostgreSQL and MySQL targets
//! loadgen run-migration
//!
//! # Only MySQL, from a custom directory
//! loadgen run-migration --backends mysql --migrations-dir ./db/migrations
//! ```
//!
//! ## Load
//! ```bash
//! # Burst: 10 workers x 1000 rows per backend
//! loadgen run-service
//!
//! # Burst with 4 workers x 250 rows per backend
//! loadgen run-service 4 250
//!
//! # Bulk: one worker writing 1,000,000 rows to the first backend
//! loadgen run-service --shape bulk
//!
//! # Escalating: 5 rounds, each adding 500 rows and 2 workers
//! loadgen run-service --shape escalating --rounds 5 --rows-increment 500 --workers-increment 2
//! ```
//!
//! ## Configuration
//! - `--config loadgen.toml` (or `LOADGEN_CONFIG`) replaces the default targets
//! - `LOADGEN_<ID>_HOST|PORT|USER|PASSWORD|DATABASE` override single fields,
//!   e.g. `LOADGEN_MYSQL_PORT=3307`

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use loadgen::{run_migration, run_service, BackendOpts};
use loadgen_framework::{PlanOverrides, Shape};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "loadgen")]
#[command(about = "Concurrent bulk-write load generator for PostgreSQL and MySQL")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert synthetic rows into every selected backend concurrently
    RunService {
        /// Workers per backend (defaults to the shape's value)
        total_workers: Option<usize>,

        /// Rows each worker inserts (defaults to the shape's value)
        rows_per_worker: Option<u64>,

        /// Load shape
        #[arg(long, value_enum, default_value = "burst")]
        shape: ShapeChoice,

        /// Number of rounds (escalating shape only)
        #[arg(long)]
        rounds: Option<u32>,

        /// Rows per worker added each round (escalating shape only)
        #[arg(long)]
        rows_increment: Option<u64>,

        /// Workers per backend added each round (escalating shape only)
        #[arg(long)]
        workers_increment: Option<usize>,

        #[command(flatten)]
        backend_opts: BackendOpts,
    },

    /// Apply pending schema migrations to every selected backend, one at a time
    RunMigration {
        /// Directory containing `<version>_<title>.up.sql` files
        #[arg(long, default_value = "migrations", env = "LOADGEN_MIGRATIONS_DIR")]
        migrations_dir: PathBuf,

        #[command(flatten)]
        backend_opts: BackendOpts,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ShapeChoice {
    /// First backend, one worker, one million rows
    Bulk,
    /// Every backend, fixed workers x rows
    Burst,
    /// Every backend, workers and rows grow each round
    Escalating,
}

impl From<ShapeChoice> for Shape {
    fn from(choice: ShapeChoice) -> Self {
        match choice {
            ShapeChoice::Bulk => Shape::Bulk,
            ShapeChoice::Burst => Shape::Burst,
            ShapeChoice::Escalating => Shape::Escalating,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunService {
            total_workers,
            rows_per_worker,
            shape,
            rounds,
            rows_increment,
            workers_increment,
            backend_opts,
        } => {
            let backends = backend_opts.resolve()?;
            let overrides = PlanOverrides {
                workers_per_backend: total_workers,
                rows_per_worker,
                rounds,
                rows_increment,
                workers_increment,
            };
            let shape = Shape::from(shape);
            let schedule = shape
                .schedule(backends.iter().map(|b| b.id.clone()).collect(), &overrides)
                .with_context(|| format!("Invalid {shape} plan"))?;

            let cancel = setup_shutdown_handler();
            let report = run_service(&backends, &schedule, cancel).await?;
            info!(
                "Total records inserted: {} in {} round(s)",
                report.total_rows(),
                report.rounds.len()
            );
        }
        Commands::RunMigration {
            migrations_dir,
            backend_opts,
        } => {
            let backends = backend_opts.resolve()?;
            run_migration(&backends, &migrations_dir).await?;
        }
    }

    Ok(())
}

/// Cancel the returned token on Ctrl+C so in-flight workers close their connections.
fn setup_shutdown_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt signal (Ctrl+C), stopping workers");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    cancel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_service_positional_args() {
        let cli = Cli::try_parse_from(["loadgen", "run-service", "4", "250"]).unwrap();
        match cli.command {
            Commands::RunService {
                total_workers,
                rows_per_worker,
                shape,
                ..
            } => {
                assert_eq!(total_workers, Some(4));
                assert_eq!(rows_per_worker, Some(250));
                assert_eq!(shape, ShapeChoice::Burst);
            }
            _ => panic!("expected run-service"),
        }
    }

    #[test]
    fn test_run_service_defaults_to_shape_values() {
        let cli = Cli::try_parse_from(["loadgen", "run-service", "--shape", "escalating"]).unwrap();
        match cli.command {
            Commands::RunService {
                total_workers,
                rows_per_worker,
                shape,
                rounds,
                ..
            } => {
                assert_eq!(total_workers, None);
                assert_eq!(rows_per_worker, None);
                assert_eq!(rounds, None);
                assert_eq!(Shape::from(shape), Shape::Escalating);
            }
            _ => panic!("expected run-service"),
        }
    }

    #[test]
    fn test_backends_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "loadgen",
            "run-migration",
            "--backends",
            "mysql,postgresql",
            "--migrations-dir",
            "db",
        ])
        .unwrap();
        match cli.command {
            Commands::RunMigration {
                migrations_dir,
                backend_opts,
            } => {
                assert_eq!(migrations_dir, PathBuf::from("db"));
                assert_eq!(backend_opts.backends, vec!["mysql", "postgresql"]);
            }
            _ => panic!("expected run-migration"),
        }
    }

    #[test]
    fn test_unknown_verb_and_bad_numbers_rejected() {
        assert!(Cli::try_parse_from(["loadgen", "run-everything"]).is_err());
        assert!(Cli::try_parse_from(["loadgen", "run-service", "many"]).is_err());
        assert!(Cli::try_parse_from(["loadgen", "run-service", "-3"]).is_err());
        assert!(Cli::try_parse_from(["loadgen"]).is_err());
    }
}
