//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::InstrumentedCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::{ExpiringFetchCache, HttpFetcher};
use crate::models::{
    AccessCountResponse, CallCountResponse, FetchQuery, FetchResponse, GetQuery, GetResponse,
    HealthResponse, ReplayResponse, StoreRequest, StoreResponse,
};
use crate::store::SharedStore;

/// Application state shared across all handlers.
///
/// Both caches are stateless handles over the same backing store.
#[derive(Clone)]
pub struct AppState {
    /// Call-tracked key/value cache
    pub cache: InstrumentedCache,
    /// Expiring cache in front of HTTP fetches
    pub pages: ExpiringFetchCache,
    /// Name of the backing store, for health reporting
    pub store_name: &'static str,
}

impl AppState {
    /// Creates a new AppState from already built caches.
    pub fn new(cache: InstrumentedCache, pages: ExpiringFetchCache, store_name: &'static str) -> Self {
        Self {
            cache,
            pages,
            store_name,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Building the instrumented cache clears `store`.
    pub async fn from_config(store: SharedStore, config: &Config) -> Result<Self> {
        let store_name = store.name();
        let cache = InstrumentedCache::new(store.clone()).await?;

        let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout))?;
        let pages = ExpiringFetchCache::new(store, fetcher)
            .with_ttl(config.fetch_ttl)
            .with_dedup(config.fetch_dedup);

        Ok(Self::new(cache, pages, store_name))
    }
}

/// Handler for PUT /store
///
/// Stores a value under a fresh random key.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    let value = req
        .to_value()
        .map_err(|e| CacheError::InvalidRequest(e.to_string()))?;

    let key = state.cache.store(value).await?;

    Ok(Json(StoreResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Returns raw bytes (null when absent), or the value decoded as `?as=kind`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GetQuery>,
) -> Result<Json<GetResponse>> {
    let response = match query.kind {
        Some(kind) => {
            let value = state.cache.get_as(&key, kind).await?;
            GetResponse::decoded(key, value)
        }
        None => {
            let bytes = state.cache.get(&key).await?;
            GetResponse::raw(key, bytes)
        }
    };

    Ok(Json(response))
}

/// Handler for GET /replay/:operation
pub async fn replay_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
) -> Result<Json<ReplayResponse>> {
    let history = state.cache.replayer().history(&operation).await?;

    Ok(Json(ReplayResponse {
        calls: history.len(),
        lines: history.render(),
        operation,
    }))
}

/// Handler for GET /calls/:operation
pub async fn calls_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
) -> Result<Json<CallCountResponse>> {
    let count = state.cache.call_count(&operation).await?;

    Ok(Json(CallCountResponse { operation, count }))
}

/// Handler for GET /fetch
///
/// Fetches a resource through the expiring cache.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<FetchResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let body = state.pages.fetch(&query.resource).await?;

    Ok(Json(FetchResponse {
        resource: query.resource,
        body,
    }))
}

/// Handler for GET /fetch/count
pub async fn fetch_count_handler(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<AccessCountResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let count = state.pages.access_count(&query.resource).await?;

    Ok(Json(AccessCountResponse {
        resource: query.resource,
        count,
    }))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.store_name))
}
