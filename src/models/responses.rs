//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies. Shared store
//! responses also derive `Deserialize` so the HTTP client can read them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats};

/// Response body for `GET /get?key=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// Whether a fresh entry was found
    pub hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl GetResponse {
    pub fn hit(key: impl Into<String>, entry: CacheEntry) -> Self {
        Self {
            key: key.into(),
            hit: true,
            data: Some(entry.value),
            expires_at: Some(entry.expires_at),
        }
    }

    pub fn miss(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hit: false,
            data: None,
            expires_at: None,
        }
    }

    /// Converts back into an entry; a hit without data counts as a miss.
    pub fn into_entry(self) -> Option<CacheEntry> {
        match (self.hit, self.data, self.expires_at) {
            (true, Some(value), Some(expires_at)) if !value.is_null() => {
                Some(CacheEntry { value, expires_at })
            }
            _ => None,
        }
    }
}

/// Response body for `POST /set`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResponse {
    /// The key that was set
    pub key: String,
    pub expires_at: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, expires_at: u64) -> Self {
        Self {
            key: key.into(),
            expires_at,
        }
    }
}

/// Response body for `POST /delete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Number of keys that existed and were removed
    pub deleted: usize,
}

/// Response body for `POST /clear`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    /// Number of records dropped
    pub cleared: usize,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    /// Raw record count, stale records included
    pub total_entries: usize,
    /// Stale records not purged yet
    pub expired_entries: usize,
    pub active_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            total_entries: stats.total_entries,
            expired_entries: stats.expired_entries,
            active_entries: stats.active_entries(),
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
