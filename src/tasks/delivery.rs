//! Outbound Delivery Worker
//!
//! A single background task drains due jobs from the retry queue. It wakes on
//! a fixed interval, or immediately when signalled after an enqueue or replay.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::queue::{DeliveryError, JobStatus, OutboundSender, RetryQueue};

/// Outcome counts for one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryPass {
    pub attempted: usize,
    pub delivered: usize,
    pub rescheduled: usize,
    pub dead_lettered: usize,
}

/// Attempts every job that is currently due, one at a time.
///
/// The queue lock is released while a send is in progress. Sender errors and
/// timeouts are recorded on the job and never returned.
pub async fn deliver_due(
    queue: &RwLock<RetryQueue>,
    sender: &dyn OutboundSender,
    timeout: Duration,
) -> DeliveryPass {
    deliver_until(queue, sender, timeout, || false).await
}

async fn deliver_until(
    queue: &RwLock<RetryQueue>,
    sender: &dyn OutboundSender,
    timeout: Duration,
    should_stop: impl Fn() -> bool,
) -> DeliveryPass {
    let mut pass = DeliveryPass::default();
    // Bound the pass so jobs rescheduled with a tiny backoff are left for the next one.
    let budget = queue.read().await.snapshot().pending;

    while pass.attempted < budget && !should_stop() {
        let Some(job) = queue.write().await.claim_next_due() else {
            break;
        };
        pass.attempted += 1;

        let outcome = match tokio::time::timeout(timeout, sender.send(&job.payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        };

        let mut guard = queue.write().await;
        match outcome {
            Ok(receipt) => match guard.record_success(&job.id) {
                Ok(()) => {
                    debug!(job_id = %job.id, receipt = %receipt, "Outbound job delivered");
                    pass.delivered += 1;
                }
                Err(e) => warn!(job_id = %job.id, "Could not record delivery: {}", e),
            },
            Err(error) => match guard.record_failure(&job.id, error.to_string()) {
                Ok(JobStatus::DeadLettered) => pass.dead_lettered += 1,
                Ok(_) => pass.rescheduled += 1,
                Err(e) => warn!(job_id = %job.id, "Could not record failure: {}", e),
            },
        }
    }

    pass
}

/// Handle to the running delivery worker.
pub struct DeliveryWorker {
    waker: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl DeliveryWorker {
    /// Signal used to wake the worker ahead of its poll interval.
    pub fn waker(&self) -> Arc<Notify> {
        self.waker.clone()
    }

    /// Stops the worker after its current attempt and waits for it to exit.
    ///
    /// Jobs that were not yet claimed stay pending.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        self.waker.notify_one();
        if let Err(e) = self.handle.await {
            warn!("Delivery worker exited abnormally: {}", e);
        }
        info!("Delivery worker stopped");
    }
}

/// Spawns the delivery worker.
///
/// `waker` is shared with request handlers, which call `notify_one()` after
/// enqueueing so new jobs go out without waiting for `poll_interval`.
pub fn spawn_delivery_worker(
    queue: Arc<RwLock<RetryQueue>>,
    sender: Arc<dyn OutboundSender>,
    waker: Arc<Notify>,
    poll_interval: Duration,
    attempt_timeout: Duration,
) -> DeliveryWorker {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let wake = waker.clone();

    let handle = tokio::spawn(async move {
        info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            attempt_timeout_ms = attempt_timeout.as_millis() as u64,
            "Starting outbound delivery worker"
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let pass = deliver_until(&queue, sender.as_ref(), attempt_timeout, || {
                *shutdown_rx.borrow()
            })
            .await;
            if pass.attempted > 0 {
                info!(
                    attempted = pass.attempted,
                    delivered = pass.delivered,
                    rescheduled = pass.rescheduled,
                    dead_lettered = pass.dead_lettered,
                    "Delivery pass complete"
                );
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = wake.notified() => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    });

    DeliveryWorker {
        waker,
        shutdown: shutdown_tx,
        handle,
    }
}
