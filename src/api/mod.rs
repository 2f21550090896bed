//! API Module
//!
//! HTTP handlers and routing exposing the caches over REST.
//!
//! # Endpoints
//! - `PUT /store` - Store a value under a fresh random key
//! - `GET /get/:key` - Retrieve a value, optionally decoded with `?as=kind`
//! - `GET /replay/:operation` - Rendered call history of an operation
//! - `GET /calls/:operation` - Call counter of an operation
//! - `GET /fetch?resource=` - Fetch a resource through the expiring cache
//! - `GET /fetch/count?resource=` - Access counter of a resource
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
