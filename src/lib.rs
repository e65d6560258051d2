//! Channel Ops - operational plumbing for a chat channel gateway
//!
//! Deduplicates inbound events with a TTL+LRU idempotency cache, records
//! admin actions in a bounded audit log, and delivers outbound replies
//! through a retry queue with exponential backoff and dead-lettering.

pub mod api;
pub mod audit;
pub mod auth;
pub mod cache;
pub mod channels;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_delivery_worker};
