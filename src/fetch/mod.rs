//! Fetch Cache Module
//!
//! Caches the result of a fetch function per resource id with a fixed TTL
//! and counts every access.
//!
//! # Keys
//! - `count:{resource_id}` - access counter, bumped on every call
//! - `cached:{resource_id}` - cached body, expired by the store

mod http;
mod inflight;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::cache::{as_counter, as_text};
use crate::error::Result;
use crate::store::SharedStore;

pub use http::HttpFetcher;
pub use inflight::{InFlight, InFlightGuard};

// == Public Constants ==
/// Default lifetime of a cached body in seconds
pub const DEFAULT_FETCH_TTL: u64 = 10;

/// Key of the access counter for `resource_id`.
pub fn count_key(resource_id: &str) -> String {
    format!("count:{}", resource_id)
}

/// Key of the cached body for `resource_id`.
pub fn cached_key(resource_id: &str) -> String {
    format!("cached:{}", resource_id)
}

// == Fetch Error ==
/// Failure of the wrapped fetch function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be completed
    #[error("fetching {resource} failed: {reason}")]
    Transport { resource: String, reason: String },

    /// The resource answered with a non-success status
    #[error("fetching {resource} returned status {status}")]
    Status { resource: String, status: u16 },
}

// == Fetcher ==
/// A single-argument fetch function, e.g. an HTTP GET.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, resource_id: &str) -> std::result::Result<String, FetchError>;
}

/// Adapts an async closure taking the resource id into a [`Fetcher`].
pub struct FnFetcher<F>(pub F);

#[async_trait]
impl<F, Fut> Fetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<String, FetchError>> + Send,
{
    async fn fetch(&self, resource_id: &str) -> std::result::Result<String, FetchError> {
        (self.0)(resource_id.to_string()).await
    }
}

// == Expiring Fetch Cache ==
/// Wraps a [`Fetcher`], keeping each result in the store for a fixed TTL.
///
/// Without de-duplication, concurrent misses for the same resource each call
/// the fetcher (cache stampede). With it, they queue behind one another and
/// all but the first are served from the cache, or get the first caller's
/// error if its fetch failed.
#[derive(Clone)]
pub struct ExpiringFetchCache {
    store: SharedStore,
    fetcher: Arc<dyn Fetcher>,
    ttl_seconds: u64,
    in_flight: Option<InFlight>,
}

impl ExpiringFetchCache {
    // == Constructor ==
    /// Creates a cache with the default TTL and de-duplication enabled.
    pub fn new(store: SharedStore, fetcher: impl Fetcher + 'static) -> Self {
        Self {
            store,
            fetcher: Arc::new(fetcher),
            ttl_seconds: DEFAULT_FETCH_TTL,
            in_flight: Some(InFlight::new()),
        }
    }

    /// Sets how long fetched bodies stay cached, in whole seconds (at least 1).
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds.max(1);
        self
    }

    /// Turns per-resource de-duplication of concurrent misses on or off.
    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(InFlight::new);
        self
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    // == Fetch ==
    /// Returns the body of `resource_id`, from the cache when still fresh.
    ///
    /// The access counter is bumped before anything else and is kept even if
    /// the fetch fails. A failed fetch caches nothing.
    pub async fn fetch(&self, resource_id: &str) -> Result<String> {
        let accesses = self.store.increment(&count_key(resource_id)).await?;
        debug!(resource_id, accesses, "fetch requested");

        if let Some(body) = self.cached(resource_id).await? {
            debug!(resource_id, "fetch cache hit");
            return Ok(body);
        }

        let mut slot = match &self.in_flight {
            Some(in_flight) => {
                let slot = in_flight.acquire(resource_id).await;
                // Another caller may have filled the cache while we waited
                if let Some(body) = self.cached(resource_id).await? {
                    debug!(resource_id, "fetch cache filled while waiting");
                    return Ok(body);
                }
                if let Some(error) = slot.failure() {
                    debug!(resource_id, "fetch failed while waiting");
                    return Err(error.clone().into());
                }
                Some(slot)
            }
            None => None,
        };

        debug!(resource_id, "fetch cache miss");
        let body = match self.fetcher.fetch(resource_id).await {
            Ok(body) => body,
            Err(error) => {
                if let Some(slot) = slot.as_mut() {
                    slot.record_failure(error.clone());
                }
                return Err(error.into());
            }
        };

        self.store
            .set_with_expiry(
                &cached_key(resource_id),
                body.clone().into_bytes(),
                self.ttl_seconds,
            )
            .await?;

        Ok(body)
    }

    // == Access Count ==
    /// Number of fetch calls for `resource_id`, hits and misses alike.
    pub async fn access_count(&self, resource_id: &str) -> Result<u64> {
        match self.store.get(&count_key(resource_id)).await? {
            None => Ok(0),
            Some(bytes) => Ok(as_counter(Some(bytes.as_slice()))?),
        }
    }

    async fn cached(&self, resource_id: &str) -> Result<Option<String>> {
        match self.store.get(&cached_key(resource_id)).await? {
            None => Ok(None),
            Some(bytes) => Ok(Some(as_text(Some(bytes.as_slice()))?)),
        }
    }
}
