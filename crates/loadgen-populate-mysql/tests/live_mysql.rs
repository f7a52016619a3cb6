//! Tests against a live MySQL server.
//!
//! The ignored tests use the default local target (`admin`/`admin@localhost:3306/mydb`).

use loadgen_core::{BackendConfig, Connection, MigrationTarget};
use loadgen_populate_mysql::MySQLConnection;

#[tokio::test]
async fn test_unreachable_server_fails_to_open() {
    let mut config = BackendConfig::mysql_default();
    config.host = "127.0.0.1".to_string();
    config.port = 1;

    assert!(MySQLConnection::open(&config).await.is_err());
}

#[tokio::test]
#[ignore = "Requires a running MySQL server"]
async fn test_insert_through_connection() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = MySQLConnection::open(&BackendConfig::mysql_default()).await?;

    conn.run_script(
        "CREATE TEMPORARY TABLE loadgen_probe (name VARCHAR(255) NOT NULL, address VARCHAR(255) NOT NULL)",
    )
    .await?;
    let affected = conn
        .execute(
            "INSERT INTO loadgen_probe (name, address) VALUES (?, ?)",
            &["User_0", "Address_0"],
        )
        .await?;
    assert_eq!(affected, 1);

    let failed = conn
        .execute("INSERT INTO loadgen_missing (name) VALUES (?)", &["User_0"])
        .await;
    assert!(failed.is_err());

    conn.disconnect().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires a running MySQL server"]
async fn test_version_table_round_trip() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = MySQLConnection::open(&BackendConfig::mysql_default()).await?;

    conn.ensure_version_table().await?;
    let before = conn.current_version().await?;

    conn.set_version(999_999, true).await?;
    assert_eq!(conn.current_version().await?, Some((999_999, true)));

    match before {
        Some((version, dirty)) => conn.set_version(version, dirty).await?,
        None => conn.run_script("DELETE FROM schema_migrations").await?,
    }

    conn.disconnect().await?;
    Ok(())
}
