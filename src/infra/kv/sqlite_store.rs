// SQLite-backed KV store.
//
// Tables:
// - kv_entries: one row per key, values stored as text

use super::{KvError, KvStore};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteKvStore {
    pool: Pool<Sqlite>,
}

impl SqliteKvStore {
    pub async fn new(database_url: &str) -> Result<Self, KvError> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent).map_err(|e| KvError::Storage(e.to_string()))?;
            }
            std::fs::File::create(path_str).map_err(|e| KvError::Storage(e.to_string()))?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .connect(&conn_str)
            .await
            .map_err(|e| KvError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), KvError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| KvError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| KvError::Storage(e.to_string()))?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| KvError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        // substr instead of LIKE so `%` and `_` in post ids need no escaping
        let rows = sqlx::query(
            r#"
            SELECT key FROM kv_entries
            WHERE substr(key, 1, ?) = ?
            ORDER BY key ASC
            "#,
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KvError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.get("key")).collect())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| KvError::Storage(e.to_string()))?;
        Ok(())
    }
}
