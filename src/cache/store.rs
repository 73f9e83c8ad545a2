//! Shared Store Module
//!
//! The authoritative cache tier shared by every request and every process
//! that talks to this service. Same TTL contract as the local tier, with
//! lazy cleanup of expired records and validated writes.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{system_clock, CacheEntry, CacheStats, SharedClock, Snapshot, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Shared Store ==
/// Key/value storage with TTL expiry and hit/miss accounting.
///
/// All mutation is whole-entry replacement; the last write for a key wins.
#[derive(Debug)]
pub struct SharedStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Hit and miss counters
    stats: CacheStats,
    clock: SharedClock,
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_ms` milliseconds.
    ///
    /// Rejects an empty or oversized key, a null value and a zero TTL. These
    /// are caller mistakes, not transient failures.
    pub fn set(&mut self, key: String, value: Value, ttl_ms: u64) -> Result<CacheEntry> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.is_null() {
            return Err(CacheError::InvalidRequest(
                "Value cannot be null or missing".to_string(),
            ));
        }
        if ttl_ms == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be greater than zero".to_string(),
            ));
        }

        let entry = CacheEntry::new(value, ttl_ms, self.clock.now_ms());
        self.entries.insert(key, entry.clone());
        Ok(entry)
    }

    // == Get ==
    /// Returns the entry if present and fresh.
    ///
    /// An expired record is deleted here and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                Some(entry.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_miss();
                debug!(key = %key, "shared store entry expired");
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes the given keys and returns how many existed.
    pub fn delete<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        keys.iter()
            .filter(|key| self.entries.remove(AsRef::<str>::as_ref(key)).is_some())
            .count()
    }

    // == Clear ==
    /// Removes every record and returns the prior count.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Stats ==
    /// Returns counters plus the raw and expired record counts.
    ///
    /// Does not purge anything, so `total_entries` can include stale records.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();

        let mut stats = self.stats.clone();
        stats.set_entry_counts(self.entries.len(), expired);
        stats
    }

    // == Purge Expired ==
    /// Removes all expired records. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    // == Snapshot ==
    /// Copies every live record into a serializable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now_ms();
        let entries = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        Snapshot::new(entries, now)
    }

    /// Loads records from a snapshot, skipping those already expired.
    /// Returns the number restored.
    pub fn restore(&mut self, snapshot: Snapshot) -> usize {
        let now = self.clock.now_ms();
        let mut restored = 0;
        for (key, entry) in snapshot.entries {
            if !key.is_empty() && !entry.is_expired(now) {
                self.entries.insert(key, entry);
                restored += 1;
            }
        }
        restored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
