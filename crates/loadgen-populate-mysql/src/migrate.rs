//! Schema migrations on MySQL.

use crate::connection::MySQLConnection;
use async_trait::async_trait;
use loadgen_core::{BoxError, MigrationTarget, MIGRATIONS_TABLE};
use mysql_async::prelude::*;
use mysql_async::TxOpts;

#[async_trait]
impl MigrationTarget for MySQLConnection {
    async fn ensure_version_table(&mut self) -> Result<(), BoxError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS `{MIGRATIONS_TABLE}` (version BIGINT NOT NULL PRIMARY KEY, dirty BOOLEAN NOT NULL)"
        );
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn current_version(&mut self) -> Result<Option<(u64, bool)>, BoxError> {
        let sql = format!("SELECT version, dirty FROM `{MIGRATIONS_TABLE}` LIMIT 1");
        let row: Option<(i64, bool)> = self.conn.query_first(sql).await?;
        match row {
            Some((version, dirty)) => Ok(Some((u64::try_from(version)?, dirty))),
            None => Ok(None),
        }
    }

    async fn set_version(&mut self, version: u64, dirty: bool) -> Result<(), BoxError> {
        let version = i64::try_from(version)?;
        let mut tx = self.conn.start_transaction(TxOpts::default()).await?;
        tx.query_drop(format!("DELETE FROM `{MIGRATIONS_TABLE}`"))
            .await?;
        tx.exec_drop(
            format!("INSERT INTO `{MIGRATIONS_TABLE}` (version, dirty) VALUES (?, ?)"),
            (version, dirty),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn run_script(&mut self, sql: &str) -> Result<(), BoxError> {
        self.conn.query_drop(sql).await?;
        Ok(())
    }
}
