//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::StoredValue;

/// Response body for the STORE operation (PUT /store)
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// The generated key
    pub key: String,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value, null when absent
    pub value: Option<Value>,
}

impl GetResponse {
    /// Creates a GetResponse from raw bytes, rendered as (lossy) UTF-8
    pub fn raw(key: impl Into<String>, bytes: Option<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: bytes.map(|b| Value::String(String::from_utf8_lossy(&b).into_owned())),
        }
    }

    /// Creates a GetResponse from a decoded value
    pub fn decoded(key: impl Into<String>, value: StoredValue) -> Self {
        let value = match value {
            StoredValue::Text(text) => Value::String(text),
            StoredValue::Binary(bytes) => Value::from(bytes),
            StoredValue::Integer(int) => Value::from(int),
            // JSON has no NaN or infinities; keep them apart from an absent value
            StoredValue::Float(float) if !float.is_finite() => Value::String(float.to_string()),
            StoredValue::Float(float) => Value::from(float),
        };
        Self {
            key: key.into(),
            value: Some(value),
        }
    }
}

/// Response body for the replay endpoint (GET /replay/:operation)
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResponse {
    /// The replayed operation
    pub operation: String,
    /// Number of recorded calls
    pub calls: usize,
    /// Rendered trace, header first
    pub lines: Vec<String>,
}

/// Response body for the call counter endpoint (GET /calls/:operation)
#[derive(Debug, Clone, Serialize)]
pub struct CallCountResponse {
    pub operation: String,
    pub count: u64,
}

/// Response body for the fetch endpoint (GET /fetch)
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub resource: String,
    pub body: String,
}

/// Response body for the access counter endpoint (GET /fetch/count)
#[derive(Debug, Clone, Serialize)]
pub struct AccessCountResponse {
    pub resource: String,
    pub count: u64,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Backing store in use
    pub store: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(store: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            store: store.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
