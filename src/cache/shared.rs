//! Shared Cache Seam
//!
//! Request/response view of the shared store. Every call can fail on its own,
//! independently of the caller, so every method returns a `Result`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, SharedStore};
use crate::error::Result;

/// Operations exposed by the shared store, whatever the transport.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Fresh entry for `key`, or `None` on miss.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Stores `value` for `ttl_ms`; returns the absolute expiry.
    async fn set(&self, key: &str, value: Value, ttl_ms: u64) -> Result<u64>;

    /// Removes keys; returns how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize>;

    /// Removes everything; returns the prior count.
    async fn clear(&self) -> Result<usize>;

    async fn stats(&self) -> Result<CacheStats>;
}

// == In-Process Store ==
/// Shared store hosted in this process, reached through a lock.
#[derive(Debug, Clone, Default)]
pub struct InProcessStore {
    store: Arc<RwLock<SharedStore>>,
}

impl InProcessStore {
    pub fn new(store: Arc<RwLock<SharedStore>>) -> Self {
        Self { store }
    }

    /// The underlying store, for handlers that serve it over HTTP.
    pub fn inner(&self) -> Arc<RwLock<SharedStore>> {
        self.store.clone()
    }
}

#[async_trait]
impl SharedCache for InProcessStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        // Write lock: a stale read purges the record
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: Value, ttl_ms: u64) -> Result<u64> {
        let entry = self
            .store
            .write()
            .await
            .set(key.to_string(), value, ttl_ms)?;
        Ok(entry.expires_at)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        Ok(self.store.write().await.delete(keys))
    }

    async fn clear(&self) -> Result<usize> {
        Ok(self.store.write().await.clear())
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(self.store.read().await.stats())
    }
}
