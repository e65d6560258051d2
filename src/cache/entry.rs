//! Cache Entry Module
//!
//! Defines the structure for individual idempotency cache entries.

use serde::Serialize;
use serde_json::Value;

// == Cache Entry ==
/// A cached result for one idempotency key.
///
/// Expiry is fixed at insertion time; reads never extend it.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// The idempotency key
    pub key: String,
    /// The cached processing result
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry created at `now_ms` that lives for `ttl_seconds`.
    pub fn new(key: String, value: Value, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            key,
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is expired once `now_ms >= expires_at`,
    /// so a read at exactly the expiry instant is a miss.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now_ms` (0 once expired).
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("k".to_string(), json!({"ok": true}), 60, 1_000);

        assert_eq!(entry.key, "k");
        assert_eq!(entry.value, json!({"ok": true}));
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 61_000);
    }

    #[test]
    fn test_entry_not_expired_before_deadline() {
        let entry = CacheEntry::new("k".to_string(), Value::Null, 2, 0);
        assert!(!entry.is_expired_at(0));
        assert!(!entry.is_expired_at(1_999));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("k".to_string(), Value::Null, 2, 0);
        assert!(entry.is_expired_at(2_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(5_000));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("k".to_string(), Value::Null, 10, 0);
        assert_eq!(entry.ttl_remaining_ms(4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new("k".to_string(), Value::Null, u64::MAX, 10);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired_at(10));
    }
}
