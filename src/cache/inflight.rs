//! In-flight Key Locks
//!
//! Serializes work on the same idempotency key. The first caller holds the
//! key while it processes and caches its result; concurrent callers with the
//! same key wait and then find the cached result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

// == Key Locks ==
/// One async mutex per key currently being worked on.
///
/// Slots are created on demand and dropped with the last holder, so the map
/// only ever contains keys with a live or waiting caller.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `key`, then holds it until the
    /// returned guard is dropped.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = self.slots().entry(key.to_string()).or_default().clone();
        let held = slot.clone().lock_owned().await;

        KeyGuard {
            key: key.to_string(),
            slot: Some(slot),
            held: Some(held),
            locks: self.clone(),
        }
    }

    /// Number of keys with a live or waiting caller.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map is only touched in short non-async sections, so a poisoned
    // lock still holds a consistent map.
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Key Guard ==
/// Holds a key in [`KeyLocks`]. Released on drop, including on error paths
/// and when the owning request is cancelled.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    slot: Option<Slot>,
    held: Option<OwnedMutexGuard<()>>,
    locks: KeyLocks,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Unlock first so the next waiter can proceed.
        self.held.take();

        let mut slots = self.locks.slots();
        if let Some(slot) = self.slot.take() {
            // One reference in the map plus ours: nobody is waiting.
            if Arc::strong_count(&slot) == 2 {
                slots.remove(&self.key);
            }
        }
    }
}
