//! Cache Module
//!
//! Idempotency cache with fixed TTL expiration and LRU eviction.

mod entry;
mod inflight;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use inflight::{KeyGuard, KeyLocks};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::IdempotencyCache;
