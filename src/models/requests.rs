//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{DecodeError, StoredValue, ValueKind};

/// Request body for the STORE operation (PUT /store)
///
/// # Fields
/// - `value`: Textual form of the value to store
/// - `kind`: How to interpret `value` (default: text)
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    /// The value to store
    pub value: String,
    /// Kind of the value
    #[serde(default = "default_kind")]
    pub kind: ValueKind,
}

fn default_kind() -> ValueKind {
    ValueKind::Text
}

impl StoreRequest {
    /// Converts the request into the value to store.
    pub fn to_value(&self) -> Result<StoredValue, DecodeError> {
        StoredValue::parse(self.kind, &self.value)
    }
}

/// Query string of GET /get/:key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetQuery {
    /// Kind to decode the stored bytes as; raw bytes when absent
    #[serde(rename = "as", default)]
    pub kind: Option<ValueKind>,
}

/// Query string of GET /fetch and GET /fetch/count
#[derive(Debug, Clone, Deserialize)]
pub struct FetchQuery {
    /// Resource identifier, e.g. a URL
    pub resource: String,
}

impl FetchQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.resource.trim().is_empty() {
            return Some("Resource cannot be empty".to_string());
        }
        None
    }
}
