//! Store Module
//!
//! The key/value contract the caches are built on, plus the supplied backends.

mod entry;
mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{current_timestamp_ms, EntryData, StoredEntry};
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Shared handle to a backing store.
pub type SharedStore = Arc<dyn KeyValueStore>;

// == Batch Operations ==
/// A single write inside a multi-key batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Overwrite `key` with `value`
    Set { key: String, value: Vec<u8> },
    /// Push `value` to the tail of the list at `key`
    Append { key: String, value: Vec<u8> },
    /// Increment the counter at `key`
    Increment { key: String },
}

// == Key Value Store ==
/// Contract every backing store must satisfy.
///
/// Implementations must be safe to share between tasks; the caches on top
/// perform no locking of their own. Expiry is the store's responsibility.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// A name for logs, e.g. "memory" or "redis".
    fn name(&self) -> &'static str;

    /// Increments the counter at `key`, starting from 0, and returns the new value.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Pushes `value` to the tail of the list at `key`.
    async fn append(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Reads the inclusive range `start..=end` of the list at `key`.
    ///
    /// Negative indices count from the end, so `(0, -1)` reads everything.
    async fn range_read(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>>;

    /// Returns the length of the list at `key`, 0 if missing.
    async fn list_len(&self, key: &str) -> Result<usize>;

    /// Returns the bytes at `key`, `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrites `key`, clearing any expiry.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Overwrites `key` and expires it after `ttl_seconds`.
    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()>;

    /// Drops every key in the store.
    async fn clear(&self) -> Result<()>;

    /// Applies `ops` in order.
    ///
    /// The default runs them one by one, so a failure part way through leaves
    /// the earlier writes in place. Backends that can do better override this
    /// and report it through [`KeyValueStore::supports_atomic_batch`].
    async fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        for op in ops {
            match op {
                BatchOp::Set { key, value } => self.set(&key, value).await?,
                BatchOp::Append { key, value } => self.append(&key, value).await?,
                BatchOp::Increment { key } => {
                    self.increment(&key).await?;
                }
            }
        }
        Ok(())
    }

    /// Whether [`KeyValueStore::apply_batch`] applies all ops or none.
    fn supports_atomic_batch(&self) -> bool {
        false
    }
}

// == Range Resolution ==
/// Resolves inclusive, possibly negative list indices against `len`.
///
/// Returns `None` when the range selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || start > end || start >= len {
        None
    } else {
        Some((start as usize, end as usize))
    }
}
