//! callcache - Call-tracked key/value caching
//!
//! Stores values under random keys while counting calls and logging their
//! history, and caches fetched resources for a fixed TTL. Everything is
//! persisted in a pluggable key/value store (in-memory or Redis).

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CallHistoryReplayer, InstrumentedCache, StoredValue, ValueKind};
pub use config::Config;
pub use error::{CacheError, Result};
pub use fetch::{ExpiringFetchCache, Fetcher, FnFetcher};
pub use store::{KeyValueStore, MemoryStore, SharedStore};
pub use tasks::spawn_cleanup_task;
