//! Expired Entry Sweep
//!
//! Optional background task that removes expired shared store records so
//! they stop counting toward `totalEntries`. Without it, expired records are
//! only removed when read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

/// Spawns a task that calls [`SharedStore::purge_expired`] every `interval`.
///
/// Returns the JoinHandle so the task can be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(SharedStore::new()));
/// let sweep = spawn_sweep_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task(store: Arc<RwLock<SharedStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting expired-entry sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.purge_expired();

            if removed > 0 {
                info!(removed, "sweep removed expired entries");
            } else {
                debug!("sweep found no expired entries");
            }
        }
    })
}
