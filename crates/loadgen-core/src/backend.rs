//! Backend identity, engine kind and connection settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Table every worker inserts into.
pub const USER_TABLE: &str = "mst_user";

/// Opaque tag naming one write target (e.g. `postgresql`, `mysql`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Supported relational engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    PostgreSQL,
    MySQL,
}

impl Engine {
    /// Placeholder style the engine's driver expects.
    pub fn dialect(&self) -> Dialect {
        match self {
            Engine::PostgreSQL => Dialect::Dollar,
            Engine::MySQL => Dialect::QuestionMark,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::PostgreSQL => write!(f, "postgresql"),
            Engine::MySQL => write!(f, "mysql"),
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Engine::PostgreSQL),
            "mysql" => Ok(Engine::MySQL),
            _ => Err(format!("Unknown engine: {s}")),
        }
    }
}

/// Positional parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `$1, $2, ...`
    Dollar,
    /// `?, ?, ...`
    QuestionMark,
}

impl Dialect {
    /// Render `count` comma-separated placeholders.
    pub fn placeholders(&self, count: usize) -> String {
        let rendered: Vec<String> = match self {
            Dialect::Dollar => (1..=count).map(|i| format!("${i}")).collect(),
            Dialect::QuestionMark => (0..count).map(|_| "?".to_string()).collect(),
        };
        rendered.join(", ")
    }

    /// Build a single-row parameterized INSERT for `table` and `columns`.
    pub fn insert_statement(&self, table: &str, columns: &[&str]) -> String {
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            self.placeholders(columns.len())
        )
    }
}

/// Connection settings for one backend.
///
/// Values are resolved by the caller (defaults, config file, environment) and handed to the
/// connection providers; nothing in the core reads process-wide configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub id: BackendId,
    pub engine: Engine,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl BackendConfig {
    /// The PostgreSQL target used when no configuration is supplied.
    pub fn postgresql_default() -> Self {
        Self {
            id: BackendId::new("postgresql"),
            engine: Engine::PostgreSQL,
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: "admin".to_string(),
            database: "mydb".to_string(),
        }
    }

    /// The MySQL target used when no configuration is supplied.
    pub fn mysql_default() -> Self {
        Self {
            id: BackendId::new("mysql"),
            engine: Engine::MySQL,
            host: "localhost".to_string(),
            port: 3306,
            user: "admin".to_string(),
            password: "admin".to_string(),
            database: "mydb".to_string(),
        }
    }

    /// Default targets in the order they are migrated and reported.
    pub fn defaults() -> Vec<Self> {
        vec![Self::postgresql_default(), Self::mysql_default()]
    }

    pub fn dialect(&self) -> Dialect {
        self.engine.dialect()
    }

    /// `engine://host:port/database`, safe to log.
    ///
    /// Drivers are configured field by field; this string is never parsed back.
    pub fn target(&self) -> String {
        format!(
            "{}://{}:{}/{}",
            self.engine, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}
