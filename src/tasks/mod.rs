//! Background Tasks Module
//!
//! # Tasks
//! - Cache sweep: purges expired idempotency keys at a fixed interval
//! - Outbound delivery: drains the retry queue, waking on a timer or on enqueue

mod cleanup;
mod delivery;

pub use cleanup::spawn_cleanup_task;
pub use delivery::{deliver_due, spawn_delivery_worker, DeliveryPass, DeliveryWorker};
