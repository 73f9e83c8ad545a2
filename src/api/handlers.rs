//! API Handlers
//!
//! HTTP request handlers for the shared store boundary, the invalidation
//! trigger and the read-through CMS proxy.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::cache::{HttpStoreClient, InProcessStore, SharedCache, SharedStore, TieredCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::invalidation::{ChangeEvent, EdgePurger, HttpEdgePurger, InvalidationOutcome, Invalidator};
use crate::models::{
    ClearResponse, DeleteRequest, DeleteResponse, GetQuery, GetResponse, HealthResponse,
    SetRequest, SetResponse, StatsResponse,
};
use crate::origin::OriginClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared store hosted by this process and served over `/get`, `/set`, ...
    pub store: Arc<RwLock<SharedStore>>,
    /// Read-through cache used by the proxy
    pub cache: TieredCache,
    pub invalidator: Invalidator,
    pub origin: OriginClient,
    /// Bearer secret for `/invalidate`
    pub invalidation_secret: Option<Arc<str>>,
}

impl AppState {
    /// Wires every component from configuration around `store`.
    ///
    /// With `shared_store_url` set, the read-through cache talks to that
    /// remote store; otherwise it uses `store` in-process.
    pub fn from_config(config: &Config, store: SharedStore) -> Result<Self> {
        let store = Arc::new(RwLock::new(store));

        let shared: Arc<dyn SharedCache> = match &config.shared_store_url {
            Some(url) => Arc::new(HttpStoreClient::new(url.clone(), config.http_timeout())?),
            None => Arc::new(InProcessStore::new(store.clone())),
        };
        let cache = TieredCache::new(shared, config.cache_ttl_ms);

        let edge: Option<Arc<dyn EdgePurger>> = match &config.edge_purge_url {
            Some(url) => Some(Arc::new(HttpEdgePurger::new(
                url.clone(),
                config.edge_purge_token.clone(),
                config.http_timeout(),
            )?)),
            None => None,
        };
        let invalidator = Invalidator::new(cache.clone(), edge, config.site_url.clone());
        let origin = OriginClient::new(config.origin_url.clone(), config.http_timeout())?;

        Ok(Self {
            store,
            cache,
            invalidator,
            origin,
            invalidation_secret: config.invalidation_secret.as_deref().map(Arc::from),
        })
    }
}

/// Handler for GET /get?key=
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<Json<GetResponse>> {
    if query.key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }

    // Write lock: reading an expired record deletes it
    let entry = state.store.write().await.get(&query.key);

    Ok(Json(match entry {
        Some(entry) => GetResponse::hit(query.key, entry),
        None => GetResponse::miss(query.key),
    }))
}

/// Handler for POST /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let entry = state
        .store
        .write()
        .await
        .set(req.key.clone(), req.data, req.ttl_ms)?;

    Ok(Json(SetResponse::new(req.key, entry.expires_at)))
}

/// Handler for POST /delete
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Json<DeleteResponse> {
    let deleted = state.store.write().await.delete(&req.keys);
    Json(DeleteResponse { deleted })
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.store.write().await.clear();
    info!(cleared, "shared store cleared");
    Json(ClearResponse { cleared })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.store.read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for POST /invalidate
///
/// The token is checked before the body is parsed, so an unauthorized
/// caller never reaches any cache layer.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InvalidationOutcome>> {
    authorize(&headers, state.invalidation_secret.as_deref())?;

    let event: ChangeEvent = serde_json::from_slice(&body)
        .map_err(|e| CacheError::InvalidRequest(format!("invalid change event: {}", e)))?;

    let outcome = state.invalidator.invalidate(&event).await?;
    Ok(Json(outcome))
}

fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<()> {
    let secret = secret.ok_or_else(|| {
        CacheError::Configuration("invalidation secret is not configured".to_string())
    })?;

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CacheError::Unauthorized("missing bearer token".to_string()))?;

    if !constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        debug!("invalidation token rejected");
        return Err(CacheError::Unauthorized("invalid bearer token".to_string()));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Handler for GET /cms/*path
///
/// Serves CMS API responses through the tiered cache. The upstream URL,
/// query string included, is the cache key.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let url = state.origin.url_for(&path, query.as_deref());
    let origin = state.origin.clone();
    let upstream = url.clone();

    let fetched = state
        .cache
        .fetch(&url, || async move { origin.fetch_json(&upstream).await })
        .await?;

    let mut response = Json(fetched.value).into_response();
    response.headers_mut().insert(
        "x-cache",
        HeaderValue::from_static(fetched.source.as_header()),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn test_state(secret: Option<&str>) -> AppState {
        let config = Config {
            invalidation_secret: secret.map(str::to_string),
            ..Config::default()
        };
        AppState::from_config(&config, SharedStore::new()).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state(None);

        let req = SetRequest::new("test_key", json!({"title": "x"}), 1_000);
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let query = GetQuery {
            key: "test_key".to_string(),
        };
        let response = get_handler(State(state), Query(query)).await.unwrap();
        assert!(response.hit);
        assert_eq!(response.data, Some(json!({"title": "x"})));
    }

    #[tokio::test]
    async fn test_get_miss_is_not_an_error() {
        let state = test_state(None);

        let query = GetQuery {
            key: "nonexistent".to_string(),
        };
        let response = get_handler(State(state), Query(query)).await.unwrap();
        assert!(!response.hit);
    }

    #[tokio::test]
    async fn test_get_empty_key() {
        let state = test_state(None);
        let result = get_handler(State(state), Query(GetQuery::default())).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state(None);

        let req = SetRequest::new("", json!("value"), 1_000);
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let state = test_state(None);
        let req = SetRequest::new("k", json!(1), 1_000);
        let Json(stored) = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(stored.expires_at > 0);

        let del = || DeleteRequest {
            keys: vec!["k".to_string()],
        };
        assert_eq!(delete_handler(State(state.clone()), Json(del())).await.deleted, 1);
        assert_eq!(delete_handler(State(state), Json(del())).await.deleted, 0);
    }

    #[tokio::test]
    async fn test_clear_and_stats_handler() {
        let state = test_state(None);
        for key in ["a", "b"] {
            let req = SetRequest::new(key, json!(1), 1_000);
            let Json(stored) = set_handler(State(state.clone()), Json(req)).await.unwrap();
            assert!(stored.expires_at > 0);
        }

        assert_eq!(clear_handler(State(state.clone())).await.cleared, 2);
        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_invalidate_requires_configured_secret() {
        let state = test_state(None);
        let body = Bytes::from_static(br#"{"model":"post"}"#);

        let result = invalidate_handler(State(state), bearer("anything"), body).await;
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_invalidate_rejects_bad_token_without_side_effects() {
        let state = test_state(Some("s3cret"));
        let req = SetRequest::new("k", json!(1), 1_000);
        let Json(stored) = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(stored.expires_at > 0);

        let body = Bytes::from_static(br#"{"model":"post"}"#);
        let result = invalidate_handler(State(state.clone()), bearer("wrong"), body.clone()).await;
        assert!(matches!(result, Err(CacheError::Unauthorized(_))));

        let result = invalidate_handler(State(state.clone()), HeaderMap::new(), body).await;
        let err = result.err().unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);

        assert_eq!(state.store.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_with_valid_token() {
        let state = test_state(Some("s3cret"));
        let req = SetRequest::new("k", json!(1), 1_000);
        let Json(stored) = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(stored.expires_at > 0);

        let body = Bytes::from_static(br#"{"model":"post","entry":{"slug":"trip-report"}}"#);
        let outcome = invalidate_handler(State(state.clone()), bearer("s3cret"), body)
            .await
            .unwrap();
        assert!(outcome.purged.contains(&"/blog/trip-report".to_string()));
        assert_eq!(outcome.store_cleared, 1);
        assert!(state.store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_malformed_body() {
        let state = test_state(Some("s3cret"));
        let body = Bytes::from_static(b"{not json");

        let result = invalidate_handler(State(state), bearer("s3cret"), body).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
