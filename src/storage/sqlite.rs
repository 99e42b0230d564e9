use crate::models::{LookupRecord, NewLookupRecord};
use crate::storage::trait_def::now_millis;
use crate::storage::{HistoryStore, StorageError, StorageResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid SQLite URL: {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl HistoryStore for SqliteStorage {
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lookups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip TEXT NOT NULL,
                country TEXT NOT NULL,
                city TEXT NOT NULL,
                isp TEXT NOT NULL,
                searched_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_lookups_ip ON lookups(ip)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_lookups_searched_at ON lookups(searched_at DESC)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_by_ip(&self, ip: &str) -> StorageResult<Option<LookupRecord>> {
        let record = sqlx::query_as::<_, LookupRecord>(
            r#"
            SELECT id, ip, country, city, isp, searched_at
            FROM lookups
            WHERE ip = ?
            ORDER BY searched_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(ip)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn insert(&self, record: &NewLookupRecord) -> StorageResult<LookupRecord> {
        if record.ip.is_empty() {
            return Err(StorageError::EmptyIp);
        }

        let searched_at = now_millis()?;

        let inserted = sqlx::query_as::<_, LookupRecord>(
            r#"
            INSERT INTO lookups (ip, country, city, isp, searched_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, ip, country, city, isp, searched_at
            "#,
        )
        .bind(&record.ip)
        .bind(&record.country)
        .bind(&record.city)
        .bind(&record.isp)
        .bind(searched_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(inserted)
    }

    async fn list_recent(&self, limit: i64) -> StorageResult<Vec<LookupRecord>> {
        let records = sqlx::query_as::<_, LookupRecord>(
            r#"
            SELECT id, ip, country, city, isp, searched_at
            FROM lookups
            ORDER BY searched_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn delete_by_ip(&self, ip: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM lookups WHERE ip = ?")
            .bind(ip)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM lookups")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_sqlite() -> SqliteStorage {
        // A single connection keeps every query on the same in-memory database
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
    }

    fn new_record(ip: &str) -> NewLookupRecord {
        NewLookupRecord {
            ip: ip.to_string(),
            country: "United States".to_string(),
            city: "Mountain View".to_string(),
            isp: "Google LLC".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let storage = setup_sqlite().await;

        let inserted = storage.insert(&new_record("8.8.8.8")).await.unwrap();
        assert_eq!(inserted.ip, "8.8.8.8");
        assert!(inserted.searched_at > 0);

        let found = storage.find_by_ip("8.8.8.8").await.unwrap().unwrap();
        assert_eq!(found, inserted);

        assert!(storage.find_by_ip("1.1.1.1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_ip() {
        let storage = setup_sqlite().await;

        let result = storage.insert(&new_record("")).await;
        assert!(matches!(result, Err(StorageError::EmptyIp)));
        assert!(storage.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let storage = setup_sqlite().await;
        storage.insert(&new_record("8.8.8.8")).await.unwrap();

        storage.init().await.unwrap();
        assert_eq!(storage.list_recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_ip_removes_duplicates() {
        let storage = setup_sqlite().await;
        storage.insert(&new_record("8.8.8.8")).await.unwrap();
        storage.insert(&new_record("8.8.8.8")).await.unwrap();
        storage.insert(&new_record("1.1.1.1")).await.unwrap();

        assert_eq!(storage.delete_by_ip("8.8.8.8").await.unwrap(), 2);
        assert_eq!(storage.delete_by_ip("8.8.8.8").await.unwrap(), 0);

        let remaining = storage.list_recent(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ip, "1.1.1.1");
    }

    #[tokio::test]
    async fn test_closed_pool_reports_storage_error() {
        let storage = setup_sqlite().await;
        storage.close().await;

        assert!(matches!(
            storage.find_by_ip("8.8.8.8").await,
            Err(StorageError::Other(_))
        ));
        assert!(matches!(
            storage.list_recent(10).await,
            Err(StorageError::Other(_))
        ));
        assert!(matches!(
            storage.delete_by_ip("8.8.8.8").await,
            Err(StorageError::Other(_))
        ));
        assert!(matches!(
            storage.delete_all().await,
            Err(StorageError::Other(_))
        ));
        assert!(matches!(
            storage.insert(&new_record("8.8.8.8")).await,
            Err(StorageError::Other(_))
        ));
    }
}
