//! Backend configuration loading.
//!
//! Backends come from a TOML file when one is given, otherwise from the built-in local
//! defaults. Environment variables `LOADGEN_<ID>_<FIELD>` then override single fields, e.g.
//! `LOADGEN_MYSQL_HOST=db.internal`.

use anyhow::{bail, Context};
use loadgen_core::BackendConfig;
use serde::Deserialize;
use std::path::Path;

/// Contents of a configuration file.
///
/// ```toml
/// [[backends]]
/// id = "postgresql"
/// engine = "postgresql"
/// host = "localhost"
/// port = 5432
/// user = "admin"
/// password = "admin"
/// database = "mydb"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub backends: Vec<BackendConfig>,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: FileConfig = toml::from_str(content).context("Failed to parse config TOML")?;
        if config.backends.is_empty() {
            bail!("Config file defines no backends");
        }
        for (i, backend) in config.backends.iter().enumerate() {
            if config.backends[..i].iter().any(|b| b.id == backend.id) {
                bail!("Backend '{}' is defined more than once", backend.id);
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file: {path:?}"))
    }
}

/// Name of the environment variable overriding `field` of backend `id`.
pub fn env_key(id: &str, field: &str) -> String {
    let id: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("LOADGEN_{id}_{}", field.to_ascii_uppercase())
}

/// Apply per-field overrides looked up through `lookup`.
pub fn apply_overrides(
    backends: &mut [BackendConfig],
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    for backend in backends.iter_mut() {
        let id = backend.id.as_str().to_string();
        if let Some(host) = lookup(&env_key(&id, "host")) {
            backend.host = host;
        }
        if let Some(port) = lookup(&env_key(&id, "port")) {
            backend.port = port
                .parse()
                .with_context(|| format!("Invalid port for backend '{id}': {port}"))?;
        }
        if let Some(user) = lookup(&env_key(&id, "user")) {
            backend.user = user;
        }
        if let Some(password) = lookup(&env_key(&id, "password")) {
            backend.password = password;
        }
        if let Some(database) = lookup(&env_key(&id, "database")) {
            backend.database = database;
        }
    }
    Ok(())
}

/// Keep the backends named in `selected`, in that order. An empty selection keeps all.
pub fn select_backends(
    all: Vec<BackendConfig>,
    selected: &[String],
) -> anyhow::Result<Vec<BackendConfig>> {
    if selected.is_empty() {
        return Ok(all);
    }
    selected
        .iter()
        .map(|id| {
            all.iter()
                .find(|b| b.id.as_str() == id)
                .cloned()
                .with_context(|| format!("Unknown backend '{id}'"))
        })
        .collect()
}

/// Resolve the backends a command should target.
pub fn resolve_backends(
    path: Option<&Path>,
    selected: &[String],
) -> anyhow::Result<Vec<BackendConfig>> {
    let mut backends = match path {
        Some(path) => FileConfig::from_file(path)?.backends,
        None => BackendConfig::defaults(),
    };
    apply_overrides(&mut backends, |key| std::env::var(key).ok())?;
    select_backends(backends, selected)
}
