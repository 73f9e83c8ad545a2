//! Trailhead Cache - tiered response cache for a CMS-backed blog
//!
//! A process-local tier in front of a shared TTL store, a read-through fetch
//! helper, and an invalidator that fans content-change events out to the
//! shared store, the local tier and the edge cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod origin;
pub mod tasks;

pub use api::AppState;
pub use cache::{SharedCache, TieredCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use invalidation::{ChangeEvent, Invalidator};
pub use tasks::spawn_sweep_task;
