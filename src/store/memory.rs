//! Memory Store Module
//!
//! In-process backing store with per-key TTL, lists and counters.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{resolve_range, BatchOp, EntryData, KeyValueStore, StoredEntry};
use crate::error::{CacheError, Result};

type Entries = HashMap<String, StoredEntry>;

// == Memory Store ==
/// Key/value store held in process memory.
///
/// Expired entries are invisible to reads and are physically dropped either
/// when touched or by [`MemoryStore::cleanup_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of live keys.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired()).count()
    }

    // == Is Empty ==
    /// Returns true if no live key is held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining TTL of `key` in milliseconds, None if missing or persistent.
    pub async fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().await;
        live(&entries, key).and_then(StoredEntry::ttl_remaining_ms)
    }
}

// == Keyspace Helpers ==
fn live<'a>(entries: &'a Entries, key: &str) -> Option<&'a StoredEntry> {
    entries.get(key).filter(|entry| !entry.is_expired())
}

fn drop_if_expired(entries: &mut Entries, key: &str) {
    if entries.get(key).is_some_and(StoredEntry::is_expired) {
        entries.remove(key);
    }
}

fn wrong_type(key: &str, expected: &str) -> CacheError {
    CacheError::WrongType(format!("key '{}' does not hold {}", key, expected))
}

fn set_in(entries: &mut Entries, key: &str, value: Vec<u8>, ttl_seconds: Option<u64>) {
    entries.insert(
        key.to_string(),
        StoredEntry::new(EntryData::Bytes(value), ttl_seconds),
    );
}

fn append_in(entries: &mut Entries, key: &str, value: Vec<u8>) -> Result<()> {
    drop_if_expired(entries, key);
    let entry = entries
        .entry(key.to_string())
        .or_insert_with(|| StoredEntry::new(EntryData::List(Vec::new()), None));

    match &mut entry.data {
        EntryData::List(items) => {
            items.push(value);
            Ok(())
        }
        EntryData::Bytes(_) => Err(wrong_type(key, "a list")),
    }
}

fn increment_in(entries: &mut Entries, key: &str) -> Result<i64> {
    drop_if_expired(entries, key);
    let current = match entries.get(key).map(|entry| &entry.data) {
        None => 0,
        Some(EntryData::Bytes(bytes)) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .ok_or_else(|| wrong_type(key, "an integer"))?,
        Some(EntryData::List(_)) => return Err(wrong_type(key, "an integer")),
    };

    let next = current
        .checked_add(1)
        .ok_or_else(|| CacheError::InvalidRequest(format!("counter '{}' overflowed", key)))?;

    // Counters keep the TTL of the key they replace
    let expires_at = entries.get(key).and_then(|entry| entry.expires_at);
    let mut entry = StoredEntry::new(EntryData::Bytes(next.to_string().into_bytes()), None);
    entry.expires_at = expires_at;
    entries.insert(key.to_string(), entry);

    Ok(next)
}

fn batch_key(op: &BatchOp) -> &str {
    match op {
        BatchOp::Set { key, .. } | BatchOp::Append { key, .. } | BatchOp::Increment { key } => key,
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.write().await;
        increment_in(&mut entries, key)
    }

    async fn append(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        append_in(&mut entries, key, value)
    }

    async fn range_read(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read().await;
        match live(&entries, key).map(|entry| &entry.data) {
            None => Ok(Vec::new()),
            Some(EntryData::List(items)) => Ok(resolve_range(items.len(), start, end)
                .map(|(from, to)| items[from..=to].to_vec())
                .unwrap_or_default()),
            Some(EntryData::Bytes(_)) => Err(wrong_type(key, "a list")),
        }
    }

    async fn list_len(&self, key: &str) -> Result<usize> {
        let entries = self.entries.read().await;
        match live(&entries, key).map(|entry| &entry.data) {
            None => Ok(0),
            Some(EntryData::List(items)) => Ok(items.len()),
            Some(EntryData::Bytes(_)) => Err(wrong_type(key, "a list")),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        match live(&entries, key).map(|entry| &entry.data) {
            None => {
                debug!(key, "memory store miss");
                Ok(None)
            }
            Some(EntryData::Bytes(bytes)) => Ok(Some(bytes.clone())),
            Some(EntryData::List(_)) => Err(wrong_type(key, "a plain value")),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        set_in(&mut entries, key, value, None);
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be at least one second".to_string(),
            ));
        }

        let mut entries = self.entries.write().await;
        set_in(&mut entries, key, value, Some(ttl_seconds));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "memory store cleared");
        Ok(())
    }

    /// Applies every op under one write lock; on failure the touched keys are
    /// restored to their previous state.
    async fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut entries = self.entries.write().await;

        let mut snapshot: HashMap<String, Option<StoredEntry>> = HashMap::new();
        for op in &ops {
            let key = batch_key(op);
            if !snapshot.contains_key(key) {
                snapshot.insert(key.to_string(), entries.get(key).cloned());
            }
        }

        let outcome = ops.into_iter().try_for_each(|op| match op {
            BatchOp::Set { key, value } => {
                set_in(&mut entries, &key, value, None);
                Ok(())
            }
            BatchOp::Append { key, value } => append_in(&mut entries, &key, value),
            BatchOp::Increment { key } => increment_in(&mut entries, &key).map(|_| ()),
        });

        if outcome.is_err() {
            for (key, previous) in snapshot {
                match previous {
                    Some(entry) => entries.insert(key, entry),
                    None => entries.remove(&key),
                };
            }
        }

        outcome
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }
}
