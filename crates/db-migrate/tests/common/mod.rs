#![allow(dead_code)]

use db_migrate::prelude::*;
use tempfile::TempDir;

/// A client over a fresh file-backed database. Keep the directory alive for
/// as long as the client is used.
pub async fn file_client() -> (TempDir, SqliteClient) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite:{}", dir.path().join("test.sqlite3").display());
    let client = SqliteClient::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("Failed to open {url}: {e}"));
    (dir, client)
}

pub async fn table_exists(client: &SqliteClient, name: &str) -> bool {
    let mut session = client.session().await.expect("Failed to acquire session");
    InformationSchema::new(&mut session)
        .table_exists(name)
        .await
        .expect("Failed to query catalog")
}

pub async fn index_exists(client: &SqliteClient, name: &str) -> bool {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'index' AND name = ?")
            .bind(name)
            .fetch_optional(client.pool())
            .await
            .expect("Failed to query sqlite_master");
    row.is_some()
}

pub async fn recorded_names(client: &SqliteClient) -> Vec<String> {
    let mut session = client.session().await.expect("Failed to acquire session");
    let mut ledger = Ledger::new(&mut session);
    ledger.ensure().await.expect("Failed to create ledger");
    ledger
        .records()
        .await
        .expect("Failed to read ledger")
        .into_iter()
        .map(|record| record.name)
        .collect()
}

pub fn create_users(schema: &mut Schema) -> Result<()> {
    schema.create_table("user", |t| {
        t.primary_key();
        t.column("name", "TEXT").not_null();
        t.column("age", "INTEGER");
    });
    Ok(())
}
