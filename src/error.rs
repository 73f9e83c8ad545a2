//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected input (empty key, missing value, zero TTL, bad event body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The service itself is missing required configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or wrong bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The shared store or the edge purge API could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// An upstream dependency answered with a failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for failures that callers are expected to degrade around.
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::Transport(_) | CacheError::Upstream(_))
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) | CacheError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CacheError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
