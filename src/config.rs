//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in milliseconds applied to every write-through
    pub cache_ttl_ms: u64,
    /// Base URL of a remote shared store; `None` hosts the store in-process
    pub shared_store_url: Option<String>,
    /// Timeout for outbound HTTP calls (shared store, edge purge, origin)
    pub http_timeout_ms: u64,
    /// Bearer secret guarding the invalidation trigger
    pub invalidation_secret: Option<String>,
    /// Public site URL, used to build absolute URLs for the edge purge
    pub site_url: String,
    /// Edge cache purge endpoint; `None` disables edge purging
    pub edge_purge_url: Option<String>,
    /// Bearer token for the edge purge endpoint
    pub edge_purge_token: Option<String>,
    /// CMS origin fronted by the read-through proxy
    pub origin_url: String,
    /// Interval of the expired-entry sweep in seconds, 0 disables it
    pub sweep_interval: u64,
    /// File the shared store is snapshotted to on shutdown
    pub snapshot_path: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_MS` - Write-through TTL in ms (default: 300000)
    /// - `SHARED_STORE_URL` - Remote shared store (default: in-process)
    /// - `STORE_TIMEOUT_MS` - Outbound HTTP timeout in ms (default: 2000)
    /// - `INVALIDATION_SECRET` - Bearer secret for `/invalidate`
    /// - `SITE_URL` - Public site URL (default: http://localhost:4321)
    /// - `EDGE_PURGE_URL` / `EDGE_PURGE_TOKEN` - Edge purge API
    /// - `ORIGIN_URL` - CMS origin (default: http://localhost:1337)
    /// - `SWEEP_INTERVAL_SECS` - Expired-entry sweep (default: 0, disabled)
    /// - `SNAPSHOT_PATH` - Shared store snapshot file
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl_ms: parsed("CACHE_TTL_MS")
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.cache_ttl_ms),
            shared_store_url: non_empty("SHARED_STORE_URL"),
            http_timeout_ms: parsed("STORE_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.http_timeout_ms),
            invalidation_secret: non_empty("INVALIDATION_SECRET"),
            site_url: non_empty("SITE_URL").unwrap_or(defaults.site_url),
            edge_purge_url: non_empty("EDGE_PURGE_URL"),
            edge_purge_token: non_empty("EDGE_PURGE_TOKEN"),
            origin_url: non_empty("ORIGIN_URL").unwrap_or(defaults.origin_url),
            sweep_interval: parsed("SWEEP_INTERVAL_SECS").unwrap_or(defaults.sweep_interval),
            snapshot_path: non_empty("SNAPSHOT_PATH"),
        }
    }

    /// Outbound HTTP timeout as a Duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl_ms: 300_000,
            shared_store_url: None,
            http_timeout_ms: 2_000,
            invalidation_secret: None,
            site_url: "http://localhost:4321".to_string(),
            edge_purge_url: None,
            edge_purge_token: None,
            origin_url: "http://localhost:1337".to_string(),
            sweep_interval: 0,
            snapshot_path: None,
        }
    }
}
