//! MySQL backend for loadgen.
//!
//! Provides [`MySQLConnection`], a single exclusive connection that implements both
//! [`loadgen_core::Connection`] (for the batch writer) and [`loadgen_core::MigrationTarget`]
//! (for `run-migration`).

pub mod connection;
pub mod error;
pub mod migrate;

pub use connection::MySQLConnection;
pub use error::MySQLBackendError;
