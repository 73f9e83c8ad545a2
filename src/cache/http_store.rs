//! HTTP Shared Store Client
//!
//! Talks to a shared store hosted by another instance of this service over
//! the `/get`, `/set`, `/delete`, `/clear`, `/stats` boundary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats, SharedCache};
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteRequest, DeleteResponse, ErrorResponse, GetResponse, SetRequest,
    SetResponse,
};

/// reqwest-backed [`SharedCache`].
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    http: Client,
    base_url: String,
}

impl HttpStoreClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("building HTTP client: {}", e)))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps the store's status codes back onto `CacheError` and decodes the body.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| CacheError::Transport(format!("malformed store response: {}", e)));
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    match status {
        StatusCode::BAD_REQUEST => Err(CacheError::InvalidRequest(message)),
        _ => Err(CacheError::Transport(format!(
            "shared store returned {}: {}",
            status, message
        ))),
    }
}

#[async_trait]
impl SharedCache for HttpStoreClient {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let response = self
            .http
            .get(self.url("/get"))
            .query(&[("key", key)])
            .send()
            .await?;
        let body: GetResponse = read_json(response).await?;
        Ok(body.into_entry())
    }

    async fn set(&self, key: &str, value: Value, ttl_ms: u64) -> Result<u64> {
        let response = self
            .http
            .post(self.url("/set"))
            .json(&SetRequest::new(key, value, ttl_ms))
            .send()
            .await?;
        let body: SetResponse = read_json(response).await?;
        Ok(body.expires_at)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        let response = self
            .http
            .post(self.url("/delete"))
            .json(&DeleteRequest {
                keys: keys.to_vec(),
            })
            .send()
            .await?;
        let body: DeleteResponse = read_json(response).await?;
        Ok(body.deleted)
    }

    async fn clear(&self) -> Result<usize> {
        let response = self.http.post(self.url("/clear")).send().await?;
        let body: ClearResponse = read_json(response).await?;
        Ok(body.cleared)
    }

    async fn stats(&self) -> Result<CacheStats> {
        let response = self.http.get(self.url("/stats")).send().await?;
        read_json(response).await
    }
}
