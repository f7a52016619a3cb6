//! PostgreSQL backend for loadgen.
//!
//! Provides [`PostgreSQLConnection`], a single tokio-postgres client with its connection task,
//! implementing both [`loadgen_core::Connection`] and [`loadgen_core::MigrationTarget`].

pub mod connection;
pub mod error;
pub mod migrate;

pub use connection::PostgreSQLConnection;
pub use error::PostgreSQLBackendError;
