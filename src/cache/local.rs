//! Local Tier Module
//!
//! Process-local key/value map consulted before the shared store. Contents
//! live only as long as the process.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{system_clock, CacheEntry, SharedClock};

// == Local Tier ==
/// In-process cache tier.
///
/// Handed to request handlers explicitly (usually behind an `RwLock` inside
/// [`TieredCache`](crate::cache::TieredCache)); there is no global instance.
#[derive(Debug)]
pub struct LocalTier {
    entries: HashMap<String, CacheEntry>,
    clock: SharedClock,
}

impl Default for LocalTier {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTier {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    // == Get ==
    /// Returns the value if present and fresh; a stale entry is dropped.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Like [`get`](Self::get) but keeps the expiry alongside the value.
    pub fn get_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    // == Set ==
    /// Stores `value` for `ttl_ms`, replacing whatever was there.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl_ms: u64) {
        let entry = CacheEntry::new(value, ttl_ms, self.clock.now_ms());
        self.entries.insert(key.into(), entry);
    }

    // == Delete ==
    /// Removes each key that is present and returns how many were removed.
    pub fn delete<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        keys.iter()
            .filter(|key| self.entries.remove(AsRef::<str>::as_ref(key)).is_some())
            .count()
    }

    // == Clear ==
    /// Drops everything and returns the prior entry count.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
