//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    calls_handler, fetch_count_handler, fetch_handler, get_handler, health_handler,
    replay_handler, store_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/store", put(store_handler))
        .route("/get/:key", get(get_handler))
        .route("/replay/:operation", get(replay_handler))
        .route("/calls/:operation", get(calls_handler))
        .route("/fetch", get(fetch_handler))
        .route("/fetch/count", get(fetch_count_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
