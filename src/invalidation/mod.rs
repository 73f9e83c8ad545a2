//! Invalidation Module
//!
//! Turns a content-change event from the CMS into purges across every cache
//! layer: the shared store (cleared entirely), this process's local tier, and
//! the edge cache (best effort).

mod edge;
mod targets;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::TieredCache;
use crate::error::{CacheError, Result};

pub use edge::{EdgePurger, HttpEdgePurger, PurgeError, MAX_URLS_PER_REQUEST};
pub use targets::{known_models, purge_paths};

// == Change Event ==
/// Entry reference carried by a change event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryRef {
    #[serde(default)]
    pub slug: Option<String>,
}

/// Content-change notification, as posted by the CMS lifecycle hooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub entry: Option<EntryRef>,
}

impl ChangeEvent {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entry: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.entry = Some(EntryRef {
            slug: Some(slug.into()),
        });
        self
    }

    fn slug(&self) -> Option<&str> {
        self.entry.as_ref().and_then(|entry| entry.slug.as_deref())
    }
}

// == Outcome ==
/// What happened at the edge layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgeOutcome {
    pub attempted: bool,
    pub purged: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one invalidation, returned to the CMS.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationOutcome {
    pub model: String,
    /// Site paths purged, relative to the site root
    pub purged: Vec<String>,
    pub store_cleared: usize,
    pub local_cleared: usize,
    pub edge: EdgeOutcome,
    pub message: String,
    pub invalidated_at: String,
}

impl InvalidationOutcome {
    fn nothing_to_purge(model: &str) -> Self {
        Self {
            model: model.to_string(),
            purged: Vec::new(),
            store_cleared: 0,
            local_cleared: 0,
            edge: EdgeOutcome::default(),
            message: "nothing to purge".to_string(),
            invalidated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// == Invalidator ==
/// Stateless fan-out of change events to every cache layer.
#[derive(Clone)]
pub struct Invalidator {
    cache: TieredCache,
    edge: Option<Arc<dyn EdgePurger>>,
    site_url: String,
}

impl Invalidator {
    pub fn new(cache: TieredCache, edge: Option<Arc<dyn EdgePurger>>, site_url: impl Into<String>) -> Self {
        Self {
            cache,
            edge,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a site path.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.site_url, path)
    }

    /// Handles one change event.
    ///
    /// An unmapped or blank content type is a no-op. For a mapped one both
    /// tiers are cleared; if the shared store fails the local tier is still
    /// emptied, the error is returned and the edge is left alone. Edge
    /// failures are recorded in the outcome only.
    pub async fn invalidate(&self, event: &ChangeEvent) -> Result<InvalidationOutcome> {
        let model = event.model.trim();

        let Some(paths) = purge_paths(model, event.slug()) else {
            info!(model = %model, "no cached representation, nothing to purge");
            return Ok(InvalidationOutcome::nothing_to_purge(model));
        };

        // The store cannot be queried by content type, so everything goes
        let cleared = self.cache.clear_all().await.map_err(|e| {
            warn!(model = %model, error = %e, "shared store clear failed");
            CacheError::Upstream(format!("shared store clear failed: {}", e))
        })?;
        let (store_cleared, local_cleared) = (cleared.shared, cleared.local);

        let edge = self.purge_edge(model, &paths).await;

        info!(
            model = %model,
            paths = paths.len(),
            store_cleared,
            local_cleared,
            edge_purged = edge.purged,
            "cache invalidated"
        );

        Ok(InvalidationOutcome {
            model: model.to_string(),
            message: format!("purged {} paths", paths.len()),
            purged: paths,
            store_cleared,
            local_cleared,
            edge,
            invalidated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn purge_edge(&self, model: &str, paths: &[String]) -> EdgeOutcome {
        let Some(edge) = &self.edge else {
            return EdgeOutcome::default();
        };

        let urls: Vec<String> = paths.iter().map(|p| self.absolute_url(p)).collect();
        match edge.purge(&urls).await {
            Ok(purged) => EdgeOutcome {
                attempted: true,
                purged,
                error: None,
            },
            Err(e) => {
                warn!(model = %model, purged = e.purged, error = %e.source, "edge purge failed");
                EdgeOutcome {
                    attempted: true,
                    purged: e.purged,
                    error: Some(e.source.to_string()),
                }
            }
        }
    }
}
