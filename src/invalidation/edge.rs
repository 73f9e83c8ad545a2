//! Edge Purge Module
//!
//! Client for the CDN purge API. Best effort: the invalidator logs failures
//! and carries on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

/// Most URLs the purge API accepts in one request.
pub const MAX_URLS_PER_REQUEST: usize = 30;

/// A purge that stopped partway; `purged` URLs were accepted before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{source} ({purged} URLs purged before the failure)")]
pub struct PurgeError {
    pub purged: usize,
    pub source: CacheError,
}

/// Purges absolute URLs from an upstream edge cache.
#[async_trait]
pub trait EdgePurger: Send + Sync {
    /// Returns the number of URLs accepted.
    async fn purge(&self, urls: &[String]) -> std::result::Result<usize, PurgeError>;
}

#[derive(Debug, Serialize)]
struct PurgeRequest<'a> {
    files: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

fn default_success() -> bool {
    true
}

// == HTTP Edge Purger ==
/// POSTs `{"files": [...]}` batches to a purge endpoint.
#[derive(Debug, Clone)]
pub struct HttpEdgePurger {
    http: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpEdgePurger {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token,
        })
    }

    async fn purge_batch(&self, batch: &[String]) -> Result<()> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&PurgeRequest { files: batch });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Upstream(format!(
                "edge purge returned {}: {}",
                status, body
            )));
        }

        // Some purge APIs answer 200 with success=false
        if let Ok(body) = response.json::<PurgeResponse>().await {
            if !body.success {
                return Err(CacheError::Upstream(format!(
                    "edge purge rejected: {:?}",
                    body.errors
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EdgePurger for HttpEdgePurger {
    async fn purge(&self, urls: &[String]) -> std::result::Result<usize, PurgeError> {
        let mut purged = 0;
        for batch in urls.chunks(MAX_URLS_PER_REQUEST) {
            self.purge_batch(batch)
                .await
                .map_err(|source| PurgeError { purged, source })?;
            purged += batch.len();
            debug!(count = batch.len(), "edge purge batch accepted");
        }
        Ok(purged)
    }
}
