use crate::models::{LookupRecord, NewLookupRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Number of records shown on the home page
pub const HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("lookup record must have a non-empty ip")]
    EmptyIp,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Other(err.into())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence for past lookups.
///
/// Every operation is atomic on its own; nothing spans two calls. In particular
/// `find_by_ip` followed by `insert` can race with a concurrent request for the
/// same address, and both inserts will land.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> StorageResult<()>;

    /// Most recent record for an address, if any
    async fn find_by_ip(&self, ip: &str) -> StorageResult<Option<LookupRecord>>;

    /// Append a record stamped with the current time
    async fn insert(&self, record: &NewLookupRecord) -> StorageResult<LookupRecord>;

    /// Newest first, at most `limit` records
    async fn list_recent(&self, limit: i64) -> StorageResult<Vec<LookupRecord>>;

    /// Remove every record for an address, returning how many went away
    async fn delete_by_ip(&self, ip: &str) -> StorageResult<u64>;

    async fn delete_all(&self) -> StorageResult<u64>;

    /// Release pooled connections
    async fn close(&self);
}

pub(crate) fn now_millis() -> StorageResult<i64> {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| StorageError::Other(e.into()))?;
    Ok(elapsed.as_millis() as i64)
}
