//! Engine dispatch for connection acquisition.

use async_trait::async_trait;
use loadgen_core::{
    BackendConfig, BackendId, Connection, ConnectionProvider, Dialect, Engine, LoadError,
};
use loadgen_populate_mysql::MySQLConnection;
use loadgen_populate_postgresql::PostgreSQLConnection;
use std::collections::HashMap;
use tracing::debug;

/// Opens a fresh driver connection per acquisition, chosen by the backend's engine.
pub struct DriverProvider {
    backends: HashMap<BackendId, BackendConfig>,
}

impl DriverProvider {
    pub fn new(backends: &[BackendConfig]) -> Self {
        Self {
            backends: backends
                .iter()
                .map(|b| (b.id.clone(), b.clone()))
                .collect(),
        }
    }

    /// Placeholder dialect of every known backend.
    pub fn dialects(&self) -> HashMap<BackendId, Dialect> {
        self.backends
            .iter()
            .map(|(id, config)| (id.clone(), config.dialect()))
            .collect()
    }
}

#[async_trait]
impl ConnectionProvider for DriverProvider {
    async fn acquire(&self, backend: &BackendId) -> Result<Box<dyn Connection>, LoadError> {
        let config = self
            .backends
            .get(backend)
            .ok_or_else(|| LoadError::connect(backend, format!("unknown backend '{backend}'")))?;

        debug!("Opening connection to {} ({})", backend, config.target());
        match config.engine {
            Engine::PostgreSQL => {
                let conn = PostgreSQLConnection::open(config)
                    .await
                    .map_err(|e| LoadError::connect(backend, e))?;
                Ok(Box::new(conn))
            }
            Engine::MySQL => {
                let conn = MySQLConnection::open(config)
                    .await
                    .map_err(|e| LoadError::connect(backend, e))?;
                Ok(Box::new(conn))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialects_follow_engine() {
        let provider = DriverProvider::new(&BackendConfig::defaults());
        let dialects = provider.dialects();

        assert_eq!(dialects.len(), 2);
        assert_eq!(dialects[&BackendId::new("postgresql")], Dialect::Dollar);
        assert_eq!(dialects[&BackendId::new("mysql")], Dialect::QuestionMark);
    }

    #[tokio::test]
    async fn test_unknown_backend_is_connect_failure() {
        let provider = DriverProvider::new(&BackendConfig::defaults());
        let result = provider.acquire(&BackendId::new("oracle")).await;

        match result {
            Err(LoadError::Connect { backend, .. }) => assert_eq!(backend.as_str(), "oracle"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected a connect failure"),
        }
    }
}
