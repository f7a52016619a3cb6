//! Exclusive PostgreSQL connection.

use crate::error::PostgreSQLBackendError;
use async_trait::async_trait;
use loadgen_core::{BackendConfig, BoxError, Connection};
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error, warn};

/// One client plus the task driving its socket.
pub struct PostgreSQLConnection {
    pub(crate) client: Client,
    connection: JoinHandle<Result<(), tokio_postgres::Error>>,
}

/// Driver configuration for `config`, without TLS.
pub fn pg_config(config: &BackendConfig) -> Config {
    let mut pg = Config::new();
    pg.host(config.host.as_str())
        .port(config.port)
        .user(config.user.as_str())
        .password(config.password.as_str())
        .dbname(config.database.as_str())
        .ssl_mode(SslMode::Disable);
    pg
}

impl PostgreSQLConnection {
    /// Open a connection to `config` and run a liveness query.
    pub async fn open(config: &BackendConfig) -> Result<Self, PostgreSQLBackendError> {
        let (client, connection) = pg_config(config).connect(NoTls).await?;

        // Spawn the connection task
        let target = config.target();
        let connection = tokio::spawn(async move {
            let result = connection.await;
            if let Err(e) = &result {
                error!("PostgreSQL connection error on {}: {}", target, e);
            }
            result
        });

        // Test connection
        client.simple_query("SELECT 1").await?;

        debug!("Connected to {}", config.target());
        Ok(Self { client, connection })
    }

    /// Drop the client and wait for the connection task to finish.
    pub async fn disconnect(self) -> Result<(), PostgreSQLBackendError> {
        let Self { client, connection } = self;
        drop(client);
        match connection.await {
            Ok(result) => Ok(result?),
            Err(join_err) => Err(PostgreSQLBackendError::Connection(join_err.to_string())),
        }
    }
}

#[async_trait]
impl Connection for PostgreSQLConnection {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, BoxError> {
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(self.client.execute(sql, &params).await?)
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = (*self).disconnect().await {
            warn!("Failed to close PostgreSQL connection: {}", e);
        }
    }
}
