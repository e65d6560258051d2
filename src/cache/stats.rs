//! Cache Statistics Module
//!
//! Process-lifetime counters for the idempotency cache.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the idempotency cache.
///
/// `hit_count`, `miss_count` and `eviction_count` are cumulative and survive
/// `clear()`; `size` is the current entry count.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Configured fixed TTL
    pub ttl_seconds: u64,
    /// Lookups that returned a live entry
    pub hit_count: u64,
    /// Lookups for missing or expired keys
    pub miss_count: u64,
    /// Entries evicted to make room for new keys
    pub eviction_count: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates stats for an empty cache with the given limits.
    pub fn new(max_size: usize, ttl_seconds: u64) -> Self {
        Self {
            max_size,
            ttl_seconds,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    pub fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new(10, 60);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.ttl_seconds, 60);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new(1, 1).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new(1, 1);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_eviction() {
        let mut stats = CacheStats::new(1, 1);
        stats.record_eviction();
        stats.record_eviction();
        assert_eq!(stats.eviction_count, 2);
    }
}
