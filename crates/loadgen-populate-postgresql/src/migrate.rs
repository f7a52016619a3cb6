//! Schema migrations on PostgreSQL.

use crate::connection::PostgreSQLConnection;
use async_trait::async_trait;
use loadgen_core::{BoxError, MigrationTarget, MIGRATIONS_TABLE};

#[async_trait]
impl MigrationTarget for PostgreSQLConnection {
    async fn ensure_version_table(&mut self) -> Result<(), BoxError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{MIGRATIONS_TABLE}\" (version BIGINT NOT NULL PRIMARY KEY, dirty BOOLEAN NOT NULL)"
        );
        self.client.batch_execute(&sql).await?;
        Ok(())
    }

    async fn current_version(&mut self) -> Result<Option<(u64, bool)>, BoxError> {
        let sql = format!("SELECT version, dirty FROM \"{MIGRATIONS_TABLE}\" LIMIT 1");
        let Some(row) = self.client.query_opt(&sql, &[]).await? else {
            return Ok(None);
        };
        let version: i64 = row.get(0);
        let dirty: bool = row.get(1);
        Ok(Some((u64::try_from(version)?, dirty)))
    }

    async fn set_version(&mut self, version: u64, dirty: bool) -> Result<(), BoxError> {
        let version = i64::try_from(version)?;
        let tx = self.client.transaction().await?;
        tx.execute(&format!("DELETE FROM \"{MIGRATIONS_TABLE}\""), &[])
            .await?;
        tx.execute(
            &format!("INSERT INTO \"{MIGRATIONS_TABLE}\" (version, dirty) VALUES ($1, $2)"),
            &[&version, &dirty],
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn run_script(&mut self, sql: &str) -> Result<(), BoxError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}
