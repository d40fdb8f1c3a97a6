use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Blob already exists: {0}")]
    AlreadyExists(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PutReceipt {
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub key: String,
    pub created_at: String,
}

/// Key-value blob storage. Writes never overwrite: blobs are immutable once
/// stored. `list` returns entries newest-first plus the total count.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, blob: &str) -> Result<PutReceipt, StorageError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn list(&self, limit: usize, offset: usize)
        -> Result<(Vec<BlobEntry>, u64), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Redis-backed blob store. Blobs live under `{namespace}:blob:{key}`; a
/// sorted set `{namespace}:index` scored by creation time drives listing.
pub struct RedisBlobStore {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisBlobStore {
    pub fn new(conn: ConnectionManager, namespace: &str) -> Self {
        Self {
            conn,
            namespace: namespace.to_string(),
        }
    }

    fn blob_key(&self, key: &str) -> String {
        format!("{}:blob:{}", self.namespace, key)
    }

    fn index_key(&self) -> String {
        format!("{}:index", self.namespace)
    }
}

#[async_trait]
impl BlobStore for RedisBlobStore {
    async fn put(&self, key: &str, blob: &str) -> Result<PutReceipt, StorageError> {
        let mut conn = self.conn.clone();

        // SET NX gives the no-overwrite guarantee.
        let created: Option<String> = redis::cmd("SET")
            .arg(self.blob_key(key))
            .arg(blob)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if created.is_none() {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }

        let _: () = conn
            .zadd(self.index_key(), key, Utc::now().timestamp_millis())
            .await?;

        Ok(PutReceipt {
            path: key.to_string(),
            size: blob.len(),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.blob_key(key)).await?;
        Ok(value)
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<BlobEntry>, u64), StorageError> {
        let mut conn = self.conn.clone();

        let stop = (offset + limit) as isize - 1;
        let members: Vec<(String, i64)> = conn
            .zrevrange_withscores(self.index_key(), offset as isize, stop)
            .await?;
        let total: u64 = conn.zcard(self.index_key()).await?;

        let entries = members
            .into_iter()
            .map(|(key, score)| BlobEntry {
                key,
                created_at: DateTime::<Utc>::from_timestamp_millis(score)
                    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .unwrap_or_default(),
            })
            .collect();

        Ok((entries, total))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.blob_key(key)).await?;
        let _: () = conn.zrem(self.index_key(), key).await?;
        Ok(())
    }
}

struct StoredBlob {
    data: String,
    created_at: DateTime<Utc>,
    seq: u64,
}

/// In-memory blob store for tests and local runs without a Redis instance.
#[derive(Default)]
pub struct MemoryBlobStore {
    entries: RwLock<HashMap<String, StoredBlob>>,
    seq: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, blob: &str) -> Result<PutReceipt, StorageError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        entries.insert(
            key.to_string(),
            StoredBlob {
                data: blob.to_string(),
                created_at: Utc::now(),
                seq,
            },
        );
        Ok(PutReceipt {
            path: key.to_string(),
            size: blob.len(),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).map(|b| b.data.clone()))
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<BlobEntry>, u64), StorageError> {
        let entries = self.entries.read().await;
        let total = entries.len() as u64;

        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by(|a, b| b.1.seq.cmp(&a.1.seq));

        let page = sorted
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(key, blob)| BlobEntry {
                key: key.clone(),
                created_at: blob.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            })
            .collect();

        Ok((page, total))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
