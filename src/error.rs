//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::DecodeError;
use crate::fetch::FetchError;

// == Cache Error Enum ==
/// Unified error type for the cache and its backing stores.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store unreachable or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Operation against a key holding the wrong kind of value
    #[error("Wrong type: {0}")]
    WrongType(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Stored bytes could not be decoded as the requested kind
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Wrapped fetch function failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.code() == Some("WRONGTYPE") {
            CacheError::WrongType(err.to_string())
        } else {
            CacheError::StoreUnavailable(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::WrongType(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::StoreUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::WrongType("list".into()), StatusCode::CONFLICT),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::Decode(DecodeError::Absent), StatusCode::UNPROCESSABLE_ENTITY),
            (
                CacheError::Fetch(FetchError::Status {
                    resource: "http://x".into(),
                    status: 500,
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (CacheError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_decode_error_converts() {
        let err: CacheError = DecodeError::Absent.into();
        assert!(matches!(err, CacheError::Decode(DecodeError::Absent)));
    }
}
