//! Schema migrations.
//!
//! Migration files live in one directory and are named `<version>_<title>.up.sql` /
//! `<version>_<title>.down.sql`. The applied state is a single row in [`MIGRATIONS_TABLE`]
//! holding the current version and a `dirty` flag that stays set when a script fails halfway.

use crate::backend::BackendId;
use crate::error::{BoxError, LoadError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Table recording the current schema version.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// One forward migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: u64,
    pub name: String,
    pub up_sql: String,
}

/// Ordered, duplicate-free set of forward migrations.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Build a set, ordering by version and rejecting duplicate versions.
    pub fn new(migrations: Vec<Migration>) -> Result<Self, LoadError> {
        let mut by_version: BTreeMap<u64, Migration> = BTreeMap::new();
        for migration in migrations {
            let version = migration.version;
            if let Some(existing) = by_version.insert(version, migration) {
                return Err(LoadError::Config(format!(
                    "duplicate migration version {version} ({})",
                    existing.name
                )));
            }
        }
        Ok(Self {
            migrations: by_version.into_values().collect(),
        })
    }

    /// Load every `*.up.sql` file from `dir`.
    ///
    /// Files whose names do not follow the migration naming scheme are skipped.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            LoadError::Config(format!(
                "cannot read migrations directory {}: {e}",
                dir.display()
            ))
        })?;

        let mut migrations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::Config(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((version, name)) = parse_up_file_name(file_name) else {
                debug!("Skipping non-migration file: {}", file_name);
                continue;
            };
            let up_sql = std::fs::read_to_string(&path).map_err(|e| {
                LoadError::Config(format!("cannot read migration {}: {e}", path.display()))
            })?;
            migrations.push(Migration {
                version,
                name,
                up_sql,
            });
        }

        Self::new(migrations)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn latest_version(&self) -> Option<u64> {
        self.migrations.last().map(|m| m.version)
    }

    /// Migrations newer than `current`, in ascending version order.
    pub fn pending(&self, current: Option<u64>) -> impl Iterator<Item = &Migration> {
        self.migrations
            .iter()
            .filter(move |m| current.is_none_or(|v| m.version > v))
    }
}

/// Parse `<version>_<title>.up.sql` into `(version, title)`.
fn parse_up_file_name(file_name: &str) -> Option<(u64, String)> {
    let stem = file_name.strip_suffix(".up.sql")?;
    let (version, title) = stem.split_once('_')?;
    let version = version.parse().ok()?;
    Some((version, title.to_string()))
}

/// Result of applying migrations to one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied {
        from: Option<u64>,
        to: u64,
        count: usize,
    },
    NoChange,
}

/// Driver-specific access to the version table and script execution.
#[async_trait]
pub trait MigrationTarget: Send {
    /// Create [`MIGRATIONS_TABLE`] if it does not exist.
    async fn ensure_version_table(&mut self) -> Result<(), BoxError>;

    /// Current `(version, dirty)` row, if any migration was ever recorded.
    async fn current_version(&mut self) -> Result<Option<(u64, bool)>, BoxError>;

    /// Replace the recorded version.
    async fn set_version(&mut self, version: u64, dirty: bool) -> Result<(), BoxError>;

    /// Execute a migration body, which may contain several statements.
    async fn run_script(&mut self, sql: &str) -> Result<(), BoxError>;
}

/// Apply every migration newer than the recorded version.
///
/// "Nothing to apply" is reported as [`MigrationOutcome::NoChange`], not as an error. A dirty
/// version row stops the run before anything is executed.
pub async fn apply_pending<T>(
    backend: &BackendId,
    target: &mut T,
    set: &MigrationSet,
) -> Result<MigrationOutcome, LoadError>
where
    T: MigrationTarget + ?Sized,
{
    let fail = |step: &str, e: BoxError| LoadError::migration(backend, format!("{step}: {e}"));

    target
        .ensure_version_table()
        .await
        .map_err(|e| fail("creating version table", e))?;

    let current = match target
        .current_version()
        .await
        .map_err(|e| fail("reading current version", e))?
    {
        Some((version, true)) => {
            return Err(LoadError::migration(
                backend,
                format!("database is dirty at version {version}; fix it manually and reset the version row"),
            ));
        }
        Some((version, false)) => Some(version),
        None => None,
    };

    let mut applied = 0usize;
    let mut last = None;
    for migration in set.pending(current) {
        info!(
            "Applying migration {} ({}) to {}",
            migration.version, migration.name, backend
        );
        target
            .set_version(migration.version, true)
            .await
            .map_err(|e| fail("marking version dirty", e))?;
        target.run_script(&migration.up_sql).await.map_err(|e| {
            fail(
                &format!("running {}_{}", migration.version, migration.name),
                e,
            )
        })?;
        target
            .set_version(migration.version, false)
            .await
            .map_err(|e| fail("recording version", e))?;
        debug!("Migration {} applied to {}", migration.version, backend);

        applied += 1;
        last = Some(migration.version);
    }

    Ok(match last {
        Some(to) => MigrationOutcome::Applied {
            from: current,
            to,
            count: applied,
        },
        None => MigrationOutcome::NoChange,
    })
}
