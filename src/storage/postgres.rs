use crate::models::{LookupRecord, NewLookupRecord};
use crate::storage::trait_def::now_millis;
use crate::storage::{HistoryStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl HistoryStore for PostgresStorage {
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lookups (
                id BIGSERIAL PRIMARY KEY,
                ip TEXT NOT NULL,
                country TEXT NOT NULL,
                city TEXT NOT NULL,
                isp TEXT NOT NULL,
                searched_at BIGINT NOT NULL
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
            WHERE ip = $1
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

        let row = sqlx::query_as::<_, LookupRecord>(
            r#"
            INSERT INTO lookups (ip, country, city, isp, searched_at)
            VALUES ($1, $2, $3, $4, $5)
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

        Ok(row)
    }

    async fn list_recent(&self, limit: i64) -> StorageResult<Vec<LookupRecord>> {
        let records = sqlx::query_as::<_, LookupRecord>(
            r#"
            SELECT id, ip, country, city, isp, searched_at
            FROM lookups
            ORDER BY searched_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(records)
    }

    async fn delete_by_ip(&self, ip: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM lookups WHERE ip = $1")
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
