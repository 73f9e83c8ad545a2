//! Request DTOs for the shared store boundary
//!
//! Defines the structure of incoming HTTP request bodies and query strings.
//! The same types are serialized by [`HttpStoreClient`](crate::cache::HttpStoreClient).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /set`
///
/// Missing fields deserialize to their empty value so that validation can
/// answer with a 400 instead of a JSON extraction failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRequest {
    /// The cache key
    #[serde(default)]
    pub key: String,
    /// The value to store; missing and `null` are both rejected
    #[serde(default)]
    pub data: Value,
    /// TTL in milliseconds; must be non-zero
    #[serde(default)]
    pub ttl_ms: u64,
}

impl SetRequest {
    pub fn new(key: impl Into<String>, data: Value, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            data,
            ttl_ms,
        }
    }
}

/// Query string for `GET /get?key=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    pub key: String,
}

/// Request body for `POST /delete`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}
