//! Cache Module
//!
//! Two cache tiers with TTL expiry (process-local and shared), the seam to
//! reach the shared store over HTTP, and the read-through front that ties
//! them together.

mod cacheable;
mod clock;
mod entry;
mod http_store;
mod local;
mod shared;
mod snapshot;
mod stats;
mod store;
mod tiered;


// Re-export public types
pub use cacheable::is_cacheable;
pub use clock::{current_timestamp_ms, system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::CacheEntry;
pub use http_store::HttpStoreClient;
pub use local::LocalTier;
pub use shared::{InProcessStore, SharedCache};
pub use snapshot::{load_snapshot, save_snapshot, Snapshot};
pub use stats::CacheStats;
pub use store::SharedStore;
pub use tiered::{CacheSource, ClearedTiers, DeletedKeys, Fetched, TieredCache};

// == Public Constants ==
/// Maximum allowed key length in bytes. Keys are usually full upstream URLs.
pub const MAX_KEY_LENGTH: usize = 2048;
