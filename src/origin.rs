//! CMS origin client used as the producer behind the read-through proxy.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{CacheError, Result};

#[derive(Debug, Clone)]
pub struct OriginClient {
    http: Client,
    base_url: String,
}

impl OriginClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Upstream URL for an API path and raw query string. Doubles as the
    /// cache key.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/api/{}?{}", self.base_url, path, query),
            None => format!("{}/api/{}", self.base_url, path),
        }
    }

    /// GETs `url` and decodes the JSON body.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::Upstream(format!("origin unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Upstream(format!(
                "origin returned {} for {}",
                status, url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CacheError::Upstream(format!("origin sent invalid JSON: {}", e)))
    }
}
