//! Cache Statistics Module
//!
//! Tracks shared store hits, misses and entry counts.

use serde::{Deserialize, Serialize};

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// `total_entries` is the raw record count. Expired records stay in it until
/// they are read or swept, which is why `expired_entries` is reported beside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Current number of records held, stale ones included
    pub total_entries: usize,
    /// Records past their expiry that have not been purged yet
    #[serde(default)]
    pub expired_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Entries that would currently be served.
    pub fn active_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Update Entry Counts ==
    pub fn set_entry_counts(&mut self, total: usize, expired: usize) {
        self.total_entries = total;
        self.expired_entries = expired;
    }
}
