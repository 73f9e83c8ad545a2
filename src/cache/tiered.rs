//! Tiered Cache Module
//!
//! Read-through front for application code: local tier, then shared store,
//! then the origin producer. Shared store failures never reach the caller;
//! reads degrade to a miss and writes are dropped.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{is_cacheable, system_clock, LocalTier, SharedCache, SharedClock};
use crate::error::Result;

// == Cache Source ==
/// Which layer answered a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Local,
    Shared,
    Origin,
}

impl CacheSource {
    /// Value for the `x-cache` response header.
    pub fn as_header(&self) -> &'static str {
        match self {
            CacheSource::Local => "HIT-LOCAL",
            CacheSource::Shared => "HIT-SHARED",
            CacheSource::Origin => "MISS",
        }
    }
}

/// A value plus the layer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub value: Value,
    pub source: CacheSource,
}

/// Per-tier counts from a full clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedTiers {
    pub local: usize,
    pub shared: usize,
}

/// Per-tier counts from a targeted delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedKeys {
    pub local: usize,
    /// `None` when the shared store could not be reached
    pub shared: Option<usize>,
}

// == Tiered Cache ==
/// Local tier in front of a [`SharedCache`], written through with a fixed TTL.
#[derive(Clone)]
pub struct TieredCache {
    local: Arc<RwLock<LocalTier>>,
    shared: Arc<dyn SharedCache>,
    ttl_ms: u64,
    clock: SharedClock,
}

impl fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}

impl TieredCache {
    pub fn new(shared: Arc<dyn SharedCache>, ttl_ms: u64) -> Self {
        let clock = system_clock();
        Self::with_parts(
            LocalTier::with_clock(clock.clone()),
            shared,
            ttl_ms,
            clock,
        )
    }

    /// Builds from an explicit local tier and clock.
    pub fn with_parts(
        local: LocalTier,
        shared: Arc<dyn SharedCache>,
        ttl_ms: u64,
        clock: SharedClock,
    ) -> Self {
        Self {
            local: Arc::new(RwLock::new(local)),
            shared,
            ttl_ms,
            clock,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn shared(&self) -> Arc<dyn SharedCache> {
        self.shared.clone()
    }

    // == Fetch ==
    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// result when it is cacheable.
    ///
    /// Producer errors are returned as-is and nothing is written.
    pub async fn fetch<F, Fut, E>(&self, key: &str, producer: F) -> std::result::Result<Fetched, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        if let Some(value) = self.local.write().await.get(key) {
            debug!(key = %key, "local tier hit");
            return Ok(Fetched {
                value,
                source: CacheSource::Local,
            });
        }

        if let Some(value) = self.read_shared(key).await {
            return Ok(Fetched {
                value,
                source: CacheSource::Shared,
            });
        }

        debug!(key = %key, "cache miss, calling origin");
        let value = producer().await?;

        if is_cacheable(&value) {
            self.write_through(key, &value).await;
        } else {
            debug!(key = %key, "origin returned empty result, not caching");
        }

        Ok(Fetched {
            value,
            source: CacheSource::Origin,
        })
    }

    /// Shared store lookup; on hit the local tier gets the remaining TTL.
    async fn read_shared(&self, key: &str) -> Option<Value> {
        let entry = match self.shared.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "shared store read failed, treating as miss");
                return None;
            }
        };

        let remaining = entry.ttl_remaining_ms(self.clock.now_ms());
        if remaining == 0 {
            return None;
        }

        debug!(key = %key, remaining_ms = remaining, "shared store hit");
        self.local
            .write()
            .await
            .set(key, entry.value.clone(), remaining);
        Some(entry.value)
    }

    async fn write_through(&self, key: &str, value: &Value) {
        self.local.write().await.set(key, value.clone(), self.ttl_ms);

        if let Err(e) = self.shared.set(key, value.clone(), self.ttl_ms).await {
            warn!(key = %key, error = %e, "shared store write failed, dropping");
        }
    }

    // == Invalidation ==
    /// Deletes keys from both tiers.
    pub async fn invalidate_keys(&self, keys: &[String]) -> DeletedKeys {
        let local = self.local.write().await.delete(keys);
        let shared = match self.shared.delete(keys).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "shared store delete failed");
                None
            }
        };
        DeletedKeys { local, shared }
    }

    /// Clears this process's local tier.
    pub async fn clear_local(&self) -> usize {
        self.local.write().await.clear()
    }

    /// Clears the shared store. Unlike reads and writes, the error is
    /// returned so the invalidator can report it.
    pub async fn clear_shared(&self) -> Result<usize> {
        self.shared.clear().await
    }

    /// Clears both tiers.
    ///
    /// The local tier is cleared even when the shared store fails; the
    /// shared error is still returned.
    pub async fn clear_all(&self) -> Result<ClearedTiers> {
        let shared = self.shared.clear().await;
        let local = self.clear_local().await;
        Ok(ClearedTiers {
            local,
            shared: shared?,
        })
    }

    /// Number of entries held in the local tier, stale ones included.
    pub async fn local_len(&self) -> usize {
        self.local.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheStats, InProcessStore, ManualClock, SharedStore};
    use crate::error::CacheError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Shared store that is always down.
    struct Unreachable;

    #[async_trait]
    impl SharedCache for Unreachable {
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
            Err(CacheError::Transport("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: Value, _ttl_ms: u64) -> Result<u64> {
            Err(CacheError::Transport("connection refused".into()))
        }
        async fn delete(&self, _keys: &[String]) -> Result<usize> {
            Err(CacheError::Transport("connection refused".into()))
        }
        async fn clear(&self) -> Result<usize> {
            Err(CacheError::Transport("connection refused".into()))
        }
        async fn stats(&self) -> Result<CacheStats> {
            Err(CacheError::Transport("connection refused".into()))
        }
    }

    struct Fixture {
        cache: TieredCache,
        shared: InProcessStore,
        clock: Arc<ManualClock>,
    }

    fn fixture(ttl_ms: u64) -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let store = SharedStore::with_clock(clock.clone());
        let shared = InProcessStore::new(Arc::new(RwLock::new(store)));
        let cache = TieredCache::with_parts(
            LocalTier::with_clock(clock.clone()),
            Arc::new(shared.clone()),
            ttl_ms,
            clock.clone(),
        );
        Fixture {
            cache,
            shared,
            clock,
        }
    }

    fn counting_producer(
        calls: &AtomicUsize,
        value: Value,
    ) -> impl Future<Output = std::result::Result<Value, Infallible>> + '_ {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(value) }
    }

    #[tokio::test]
    async fn test_miss_then_local_hit() {
        let f = fixture(1_000);
        let calls = AtomicUsize::new(0);

        let first = f
            .cache
            .fetch("k", || counting_producer(&calls, json!({"data": [1]})))
            .await
            .unwrap();
        assert_eq!(first.source, CacheSource::Origin);

        let second = f
            .cache
            .fetch("k", || counting_producer(&calls, json!({"data": [2]})))
            .await
            .unwrap();
        assert_eq!(second.source, CacheSource::Local);
        assert_eq!(second.value, json!({"data": [1]}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_through_reaches_shared_store() {
        let f = fixture(1_000);

        f.cache
            .fetch("k", || async { Ok::<_, Infallible>(json!({"title": "x"})) })
            .await
            .unwrap();

        let entry = f.shared.get("k").await.unwrap().unwrap();
        assert_eq!(entry.value, json!({"title": "x"}));
        assert_eq!(entry.expires_at, 1_000);
    }

    #[tokio::test]
    async fn test_shared_hit_repopulates_local_with_remaining_ttl() {
        let f = fixture(1_000);
        f.shared.set("k", json!("from-shared"), 1_000).await.unwrap();
        f.clock.set(600);

        let fetched = f
            .cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("origin")) })
            .await
            .unwrap();
        assert_eq!(fetched.source, CacheSource::Shared);
        assert_eq!(fetched.value, json!("from-shared"));
        assert_eq!(f.cache.local_len().await, 1);

        // Local copy expires with the shared entry, not a fresh TTL
        f.shared.clear().await.unwrap();
        f.clock.set(1_000);
        let fetched = f
            .cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("origin")) })
            .await
            .unwrap();
        assert_eq!(fetched.source, CacheSource::Origin);
    }

    #[tokio::test]
    async fn test_empty_collection_is_never_cached() {
        let f = fixture(1_000);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let fetched = f
                .cache
                .fetch("k", || counting_producer(&calls, json!({"data": []})))
                .await
                .unwrap();
            assert_eq!(fetched.source, CacheSource::Origin);
            assert_eq!(fetched.value, json!({"data": []}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.cache.local_len().await, 0);
        assert!(f.shared.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_producer_error_is_returned_and_not_cached() {
        let f = fixture(1_000);

        let result = f
            .cache
            .fetch("k", || async { Err::<Value, _>("origin down") })
            .await;
        assert_eq!(result, Err("origin down"));
        assert_eq!(f.cache.local_len().await, 0);
    }

    #[tokio::test]
    async fn test_expiry_falls_through_to_origin() {
        let f = fixture(1_000);
        let calls = AtomicUsize::new(0);

        f.cache
            .fetch("k", || counting_producer(&calls, json!("v1")))
            .await
            .unwrap();

        f.clock.set(500);
        let hit = f
            .cache
            .fetch("k", || counting_producer(&calls, json!("v2")))
            .await
            .unwrap();
        assert_eq!(hit.value, json!("v1"));

        f.clock.set(1_500);
        let miss = f
            .cache
            .fetch("k", || counting_producer(&calls, json!("v2")))
            .await
            .unwrap();
        assert_eq!(miss.source, CacheSource::Origin);
        assert_eq!(miss.value, json!("v2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_shared_store_degrades() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = TieredCache::with_parts(
            LocalTier::with_clock(clock.clone()),
            Arc::new(Unreachable),
            1_000,
            clock,
        );

        let fetched = cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("fresh")) })
            .await
            .unwrap();
        assert_eq!(fetched.source, CacheSource::Origin);

        // The local tier still took the write
        let again = cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("other")) })
            .await
            .unwrap();
        assert_eq!(again.source, CacheSource::Local);

        let deleted = cache.invalidate_keys(&["k".to_string()]).await;
        assert_eq!(deleted, DeletedKeys { local: 1, shared: None });
        assert!(cache.clear_shared().await.is_err());
    }

    #[tokio::test]
    async fn test_clear_all_empties_local_when_shared_fails() {
        let cache = TieredCache::new(Arc::new(Unreachable), 1_000);
        cache
            .fetch("k", || async { Ok::<_, Infallible>(json!({"data": [1]})) })
            .await
            .unwrap();
        assert_eq!(cache.local_len().await, 1);

        let result = cache.clear_all().await;
        assert!(matches!(result, Err(CacheError::Transport(_))));
        assert_eq!(cache.local_len().await, 0);
    }

    #[tokio::test]
    async fn test_clear_all_reports_both_tiers() {
        let f = fixture(1_000);
        f.cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("v")) })
            .await
            .unwrap();

        let cleared = f.cache.clear_all().await.unwrap();
        assert_eq!(cleared, ClearedTiers { local: 1, shared: 1 });
        assert_eq!(f.shared.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_invalidate_keys_hits_both_tiers() {
        let f = fixture(1_000);
        f.cache
            .fetch("k", || async { Ok::<_, Infallible>(json!("v")) })
            .await
            .unwrap();

        let deleted = f.cache.invalidate_keys(&["k".to_string()]).await;
        assert_eq!(deleted, DeletedKeys { local: 1, shared: Some(1) });

        let deleted = f.cache.invalidate_keys(&["k".to_string()]).await;
        assert_eq!(deleted, DeletedKeys { local: 0, shared: Some(0) });
    }

    #[test]
    fn test_source_headers() {
        assert_eq!(CacheSource::Local.as_header(), "HIT-LOCAL");
        assert_eq!(CacheSource::Shared.as_header(), "HIT-SHARED");
        assert_eq!(CacheSource::Origin.as_header(), "MISS");
    }
}
