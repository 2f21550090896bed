//! Instrumented Cache Module
//!
//! Stores values under random keys while counting calls and logging history.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::codec::{decode, DecodeError, StoredValue, ValueKind};
use crate::cache::history::CallHistoryReplayer;
use crate::cache::tracker::CallTracker;
use crate::error::Result;
use crate::store::{BatchOp, SharedStore};

/// Operation name under which `store` calls are counted and logged.
pub const STORE_OPERATION: &str = "store";

// == Instrumented Cache ==
/// Key/value cache whose writes are counted and recorded.
///
/// Holds nothing but the store handle, so any number of instances may share
/// one store.
#[derive(Clone)]
pub struct InstrumentedCache {
    store: SharedStore,
    tracker: CallTracker,
    replayer: CallHistoryReplayer,
}

impl InstrumentedCache {
    // == Constructor ==
    /// Creates a cache over `store`.
    ///
    /// **Destructive:** the whole backing store is cleared first, including
    /// data written by other instances sharing it.
    pub async fn new(store: SharedStore) -> Result<Self> {
        warn!(store = store.name(), "clearing backing store for new instrumented cache");
        store.clear().await?;

        Ok(Self {
            tracker: CallTracker::new(store.clone()),
            replayer: CallHistoryReplayer::new(store.clone()),
            store,
        })
    }

    // == Store ==
    /// Stores `value` under a fresh random key and returns the key.
    ///
    /// The input log entry, the value and the output log entry are written as
    /// one batch; the call counter is bumped afterwards and a failure there
    /// does not fail the call.
    pub async fn store(&self, value: impl Into<StoredValue>) -> Result<String> {
        let value = value.into();
        let key = Uuid::new_v4().to_string();

        self.tracker
            .record(
                STORE_OPERATION,
                value.repr(),
                vec![BatchOp::Set {
                    key: key.clone(),
                    value: value.encode(),
                }],
                key.clone(),
            )
            .await?;
        self.tracker.count(STORE_OPERATION).await;

        debug!(key = %key, kind = %value.kind(), "value stored");
        Ok(key)
    }

    // == Get ==
    /// Returns the raw bytes under `key`, `None` if absent.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key).await
    }

    /// Reads `key` and hands the bytes to `decode_fn`.
    ///
    /// An absent key reaches `decode_fn` as `None`; whether that is an error
    /// or a default is up to the function.
    pub async fn get_with<T, F>(&self, key: &str, decode_fn: F) -> Result<T>
    where
        F: FnOnce(Option<&[u8]>) -> std::result::Result<T, DecodeError>,
    {
        let bytes = self.store.get(key).await?;
        Ok(decode_fn(bytes.as_deref())?)
    }

    /// Reads `key` decoded as `kind`.
    pub async fn get_as(&self, key: &str, kind: ValueKind) -> Result<StoredValue> {
        self.get_with(key, |bytes| decode(bytes, kind)).await
    }

    // == Call Count ==
    /// Number of recorded calls of `operation` according to its counter.
    pub async fn call_count(&self, operation: &str) -> Result<u64> {
        self.tracker.call_count(operation).await
    }

    // == Replay ==
    /// Renders the call history of `operation`.
    ///
    /// The header count comes from the inputs log, not the counter.
    pub async fn replay(&self, operation: &str) -> Result<Vec<String>> {
        self.replayer.replay(operation).await
    }

    /// Replayer sharing this cache's store.
    pub fn replayer(&self) -> &CallHistoryReplayer {
        &self.replayer
    }
}
