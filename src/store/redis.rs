//! Redis Store Module
//!
//! Backing store over a Redis server. Expiry is Redis-native.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{BatchOp, KeyValueStore};
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Key/value store backed by Redis through a multiplexed connection.
///
/// The connection manager is cheap to clone and reconnects on its own, so
/// one `RedisStore` can serve every concurrent caller.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    // == Constructor ==
    /// Connects to the Redis server at `url`, e.g. `redis://127.0.0.1/`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::InvalidRequest(format!("invalid Redis URL: {}", e)))?;
        let manager = ConnectionManager::new(client).await?;
        info!("Connected to Redis at {}", url);
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let value: i64 = self.conn().incr(key, 1).await?;
        Ok(value)
    }

    async fn append(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let _: i64 = self.conn().rpush(key, value).await?;
        Ok(())
    }

    async fn range_read(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        let items: Vec<Vec<u8>> = self.conn().lrange(key, start, end).await?;
        Ok(items)
    }

    async fn list_len(&self, key: &str) -> Result<usize> {
        let len: usize = self.conn().llen(key).await?;
        Ok(len)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.conn().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let _: () = self.conn().set(key, value).await?;
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be at least one second".to_string(),
            ));
        }
        let _: () = self.conn().set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _: () = redis::cmd("FLUSHDB").query_async(&mut self.conn()).await?;
        debug!("redis database flushed");
        Ok(())
    }

    /// Runs the batch as a MULTI/EXEC transaction.
    async fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                BatchOp::Set { key, value } => pipe.set(key, value).ignore(),
                BatchOp::Append { key, value } => pipe.rpush(key, value).ignore(),
                BatchOp::Increment { key } => pipe.incr(key, 1).ignore(),
            };
        }
        let _: () = pipe.query_async(&mut self.conn()).await?;
        Ok(())
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }
}
