//! Idempotency Cache Store
//!
//! HashMap storage with LRU eviction and fixed-TTL lazy expiry.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::clock::current_timestamp_ms;

// == Idempotency Cache ==
/// Bounded key -> result store used to deduplicate inbound channel events.
///
/// Expiry is fixed: `expires_at` is set on `put` and never moved by reads.
/// Eviction is least-recently-used, where both `put` and a successful `get`
/// count as a use.
#[derive(Debug)]
pub struct IdempotencyCache {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
    ttl_seconds: u64,
}

impl IdempotencyCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// `max_entries` and `ttl_seconds` come from a validated [`crate::Config`]
    /// (see [`crate::AppState::from_config`]). The clamp of a zero capacity to
    /// one only applies to direct library callers.
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(max_entries, ttl_seconds),
            max_entries,
            ttl_seconds,
        }
    }

    // == Put ==
    /// Stores a result under `key`, replacing any previous value and
    /// restarting its TTL.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.put_at(key, value, current_timestamp_ms());
    }

    pub fn put_at(&mut self, key: impl Into<String>, value: Value, now_ms: u64) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            // Reclaim dead space before evicting anything live.
            self.purge_expired_at(now_ms);
            while self.entries.len() >= self.max_entries {
                match self.lru.evict_oldest() {
                    Some(evicted) => {
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        let entry = CacheEntry::new(key.clone(), value, self.ttl_seconds, now_ms);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
    }

    // == Get ==
    /// Returns the cached result for `key` if it is still live.
    ///
    /// Expired entries are removed on access and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_at(key, current_timestamp_ms())
    }

    pub fn get_at(&mut self, key: &str, now_ms: u64) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now_ms),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Drops a single key. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ..self.stats.clone()
        }
    }

    // == Clear ==
    /// Empties the cache and returns how many entries were dropped.
    ///
    /// Counters are kept. Callers record the clear in the audit log.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        removed
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }

    pub fn purge_expired_at(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now_ms))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
