//! Loadgen Library
//!
//! A bulk-insert load generator for relational databases. Writes synthetic `mst_user` rows to
//! PostgreSQL and MySQL concurrently, one connection per worker, and applies the schema
//! migrations those writes depend on.
//!
//! # Crates
//!
//! - `loadgen_core` - backend settings, connection traits, errors, migration state machine
//! - `loadgen_framework` - round plans, worker pool fan-out, reports
//! - `loadgen_populate_mysql` - MySQL connections and migrations
//! - `loadgen_populate_postgresql` - PostgreSQL connections and migrations
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the schema on every configured backend
//! loadgen run-migration --migrations-dir migrations
//!
//! # 10 workers x 1000 rows against each backend
//! loadgen run-service 10 1000
//!
//! # 20 escalating rounds against MySQL only
//! loadgen run-service --shape escalating --backends mysql
//! ```

use clap::Args;
use loadgen_core::BackendConfig;
use std::path::PathBuf;

pub mod config;
pub mod provider;
pub mod service;

pub use provider::DriverProvider;
pub use service::{run_migration, run_service};

#[derive(Args, Clone, Debug, Default)]
pub struct BackendOpts {
    /// TOML file with `[[backends]]` entries (defaults to local PostgreSQL and MySQL)
    #[arg(long, env = "LOADGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated backend ids to target (defaults to every configured backend)
    #[arg(long, value_delimiter = ',')]
    pub backends: Vec<String>,
}

impl BackendOpts {
    /// Resolve the configured backends this command targets.
    pub fn resolve(&self) -> anyhow::Result<Vec<BackendConfig>> {
        config::resolve_backends(self.config.as_deref(), &self.backends)
    }
}
