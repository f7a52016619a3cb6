//! Exclusive MySQL connection.

use crate::error::MySQLBackendError;
use async_trait::async_trait;
use loadgen_core::{BackendConfig, BoxError, Connection};
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Idle connections are recycled after this long.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// A pool capped at one connection, holding that one connection checked out.
///
/// The pool exists only to apply the idle policy; the handle is never shared.
pub struct MySQLConnection {
    pool: Pool,
    pub(crate) conn: Conn,
}

/// Pool options: at most one open connection, none kept past [`IDLE_TIMEOUT`].
pub fn pool_opts() -> Result<PoolOpts, MySQLBackendError> {
    let constraints = PoolConstraints::new(0, 1)
        .ok_or_else(|| MySQLBackendError::Config("invalid pool constraints".to_string()))?;
    Ok(PoolOpts::default()
        .with_constraints(constraints)
        .with_inactive_connection_ttl(IDLE_TIMEOUT))
}

/// Driver options for `config`, including the one-connection pool policy.
pub fn mysql_opts(config: &BackendConfig) -> Result<OptsBuilder, MySQLBackendError> {
    Ok(OptsBuilder::default()
        .ip_or_hostname(config.host.as_str())
        .tcp_port(config.port)
        .user(Some(config.user.as_str()))
        .pass(Some(config.password.as_str()))
        .db_name(Some(config.database.as_str()))
        .pool_opts(pool_opts()?))
}

/// Positional parameters for a text-only statement.
pub fn to_params(params: &[&str]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(
        params
            .iter()
            .map(|p| Value::Bytes(p.as_bytes().to_vec()))
            .collect(),
    )
}

impl MySQLConnection {
    /// Open a connection to `config` and ping it.
    pub async fn open(config: &BackendConfig) -> Result<Self, MySQLBackendError> {
        let pool = Pool::new(mysql_opts(config)?);

        let mut conn = match pool.get_conn().await {
            Ok(conn) => conn,
            Err(e) => {
                let _ = pool.disconnect().await;
                return Err(e.into());
            }
        };
        if let Err(e) = conn.ping().await {
            drop(conn);
            let _ = pool.disconnect().await;
            return Err(e.into());
        }

        debug!("Connected to {}", config.target());
        Ok(Self { pool, conn })
    }

    /// Return the connection and shut the pool down.
    pub async fn disconnect(self) -> Result<(), MySQLBackendError> {
        let Self { pool, conn } = self;
        let closed = conn.disconnect().await;
        pool.disconnect().await?;
        closed?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MySQLConnection {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, BoxError> {
        self.conn.exec_drop(sql, to_params(params)).await?;
        Ok(self.conn.affected_rows())
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = (*self).disconnect().await {
            warn!("Failed to close MySQL connection: {}", e);
        }
    }
}
