//! Cache Sweep Task
//!
//! Background task that periodically purges expired idempotency keys.
//! Reads already expire lazily; the sweep keeps memory bounded for keys that
//! are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::IdempotencyCache;

/// Spawns a task that calls [`IdempotencyCache::purge_expired`] every
/// `cleanup_interval_secs` seconds.
///
/// The returned handle is aborted during shutdown; the task holds nothing
/// that needs draining.
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<IdempotencyCache>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting idempotency cache sweep every {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.purge_expired();

            if removed > 0 {
                info!("Cache sweep: removed {} expired keys", removed);
            } else {
                debug!("Cache sweep: no expired keys found");
            }
        }
    })
}
