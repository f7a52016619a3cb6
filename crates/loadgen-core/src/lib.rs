//! Core types shared by every loadgen crate.
//!
//! This crate knows nothing about concrete database drivers. It defines:
//! - [`BackendId`], [`Engine`], [`Dialect`] and [`BackendConfig`] describing write targets
//! - the [`Connection`] and [`ConnectionProvider`] traits the orchestrator writes through
//! - [`LoadError`], the error taxonomy every task in the fan-out reports with
//! - schema migration discovery and the driver-agnostic [`apply_pending`] state machine

pub mod backend;
pub mod connection;
pub mod error;
pub mod migrations;

pub use backend::{BackendConfig, BackendId, Dialect, Engine, USER_TABLE};
pub use connection::{Connection, ConnectionProvider};
pub use error::{BoxError, LoadError};
pub use migrations::{
    apply_pending, Migration, MigrationOutcome, MigrationSet, MigrationTarget, MIGRATIONS_TABLE,
};
