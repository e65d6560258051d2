//! Outbound Retry Queue
//!
//! At-least-once delivery bookkeeping with exponential backoff and a
//! dead-letter store. The queue only tracks state; sending is done by the
//! delivery worker in [`crate::tasks`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::current_timestamp_ms;
use crate::error::{OpsError, Result};
use crate::queue::{new_job_id, BackoffPolicy, JobId, JobStatus, OutboundMessage, RetryJob};

// == Queue Snapshot ==
/// Job counts by status, for health checks.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub in_flight: usize,
    /// Cumulative; succeeded jobs are removed from the queue
    pub succeeded: u64,
    pub dead_lettered: usize,
    /// pending + in_flight
    pub backlog: usize,
    pub max_attempts: u32,
}

// == Retry Queue ==
/// Tracks outbound jobs through pending -> in_flight -> (removed | pending | dead_lettered).
///
/// A job is dead-lettered once its failure count exceeds `max_attempts`, so
/// it gets one initial attempt plus `max_attempts` retries.
#[derive(Debug)]
pub struct RetryQueue {
    jobs: HashMap<JobId, RetryJob>,
    max_attempts: u32,
    backoff: BackoffPolicy,
    succeeded: u64,
    next_sequence: u64,
}

impl RetryQueue {
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            jobs: HashMap::new(),
            max_attempts,
            backoff,
            succeeded: 0,
            next_sequence: 0,
        }
    }

    // == Enqueue ==
    /// Adds a pending job that is due immediately.
    pub fn enqueue(&mut self, payload: OutboundMessage) -> JobId {
        self.enqueue_at(payload, current_timestamp_ms())
    }

    pub fn enqueue_at(&mut self, payload: OutboundMessage, now_ms: u64) -> JobId {
        self.enqueue_with_id_at(new_job_id(), payload, now_ms)
    }

    /// Enqueues under an id allocated earlier with [`new_job_id`], for callers
    /// that must record the id before the job exists.
    pub fn enqueue_with_id(&mut self, id: JobId, payload: OutboundMessage) -> JobId {
        self.enqueue_with_id_at(id, payload, current_timestamp_ms())
    }

    pub fn enqueue_with_id_at(&mut self, id: JobId, payload: OutboundMessage, now_ms: u64) -> JobId {
        let job = RetryJob::new(id.clone(), payload, self.next_sequence, now_ms);
        self.next_sequence += 1;

        debug!(job_id = %id, channel = %job.payload.channel, "Outbound job enqueued");
        self.jobs.insert(id.clone(), job);
        id
    }

    // == Claim ==
    /// Marks the most overdue pending job as in flight and returns a copy of it.
    pub fn claim_next_due(&mut self) -> Option<RetryJob> {
        self.claim_next_due_at(current_timestamp_ms())
    }

    pub fn claim_next_due_at(&mut self, now_ms: u64) -> Option<RetryJob> {
        let id = self
            .jobs
            .values()
            .filter(|job| job.is_due(now_ms))
            .min_by_key(|job| (job.next_attempt_at, job.sequence))
            .map(|job| job.id.clone())?;

        let job = self.jobs.get_mut(&id)?;
        job.status = JobStatus::InFlight;
        Some(job.clone())
    }

    // == Record Outcomes ==
    /// Completes an in-flight job and drops it from the queue.
    pub fn record_success(&mut self, id: &str) -> Result<()> {
        self.in_flight(id)?;
        self.jobs.remove(id);
        self.succeeded += 1;
        Ok(())
    }

    /// Records a failed attempt, then either reschedules or dead-letters the job.
    pub fn record_failure(&mut self, id: &str, error: impl Into<String>) -> Result<JobStatus> {
        self.record_failure_at(id, error, current_timestamp_ms())
    }

    pub fn record_failure_at(
        &mut self,
        id: &str,
        error: impl Into<String>,
        now_ms: u64,
    ) -> Result<JobStatus> {
        let max_attempts = self.max_attempts;
        let backoff = self.backoff;
        let job = self.in_flight(id)?;

        job.attempt_count += 1;
        job.last_error = Some(error.into());

        if job.attempt_count > max_attempts {
            job.status = JobStatus::DeadLettered;
            job.dead_lettered_at = Some(now_ms);
            warn!(
                job_id = %job.id,
                attempts = job.attempt_count,
                error = job.last_error.as_deref().unwrap_or_default(),
                "Outbound job dead-lettered"
            );
        } else {
            let delay = backoff.delay_for(job.attempt_count - 1);
            job.status = JobStatus::Pending;
            job.next_attempt_at = now_ms.saturating_add(delay.as_millis() as u64);
            debug!(
                job_id = %job.id,
                attempts = job.attempt_count,
                retry_in_ms = delay.as_millis() as u64,
                "Outbound job rescheduled"
            );
        }
        Ok(job.status)
    }

    fn in_flight(&mut self, id: &str) -> Result<&mut RetryJob> {
        match self.jobs.get_mut(id) {
            Some(job) if job.status == JobStatus::InFlight => Ok(job),
            Some(_) => Err(OpsError::NotFound(format!("Job '{}' is not in flight", id))),
            None => Err(OpsError::NotFound(format!("Job '{}' not found", id))),
        }
    }

    // == Inspection ==
    pub fn snapshot(&self) -> QueueSnapshot {
        let mut snapshot = QueueSnapshot {
            succeeded: self.succeeded,
            max_attempts: self.max_attempts,
            ..QueueSnapshot::default()
        };
        for job in self.jobs.values() {
            match job.status {
                JobStatus::Pending => snapshot.pending += 1,
                JobStatus::InFlight => snapshot.in_flight += 1,
                JobStatus::DeadLettered => snapshot.dead_lettered += 1,
                JobStatus::Succeeded => {}
            }
        }
        snapshot.backlog = snapshot.pending + snapshot.in_flight;
        snapshot
    }

    /// Dead-lettered jobs, earliest dead-lettered first.
    pub fn list_dead_letters(&self) -> Vec<RetryJob> {
        let mut dead: Vec<RetryJob> = self
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::DeadLettered)
            .cloned()
            .collect();
        dead.sort_by_key(|job| (job.dead_lettered_at, job.sequence));
        dead
    }

    pub fn job(&self, id: &str) -> Option<&RetryJob> {
        self.jobs.get(id)
    }

    // == Admin Operations ==
    /// Puts a dead-lettered job back in the queue with a fresh retry budget.
    pub fn replay(&mut self, id: &str) -> Result<RetryJob> {
        self.replay_at(id, current_timestamp_ms())
    }

    pub fn replay_at(&mut self, id: &str, now_ms: u64) -> Result<RetryJob> {
        match self.jobs.get_mut(id) {
            Some(job) if job.status == JobStatus::DeadLettered => {
                job.status = JobStatus::Pending;
                job.attempt_count = 0;
                job.last_error = None;
                job.dead_lettered_at = None;
                job.next_attempt_at = now_ms;
                Ok(job.clone())
            }
            _ => Err(OpsError::NotFound(format!(
                "Dead-lettered job '{}' not found",
                id
            ))),
        }
    }

    /// Drops every dead-lettered job and returns how many were removed.
    pub fn clear_dead_letters(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.status != JobStatus::DeadLettered);
        before - self.jobs.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn message(text: &str) -> OutboundMessage {
        OutboundMessage {
            channel: "telegram".to_string(),
            channel_id: "42".to_string(),
            text: text.to_string(),
            thread_id: None,
        }
    }

    fn queue(max_attempts: u32) -> RetryQueue {
        RetryQueue::new(
            max_attempts,
            BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(8)),
        )
    }

    #[test]
    fn test_enqueue_creates_pending_job() {
        let mut q = queue(3);
        let id = q.enqueue_at(message("hi"), 500);

        let job = q.job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempt_count, 0);
        assert_eq!(job.next_attempt_at, 500);
        assert_eq!(q.snapshot().pending, 1);
    }

    #[test]
    fn test_enqueue_with_preallocated_id() {
        let mut q = queue(3);
        let id = new_job_id();
        assert_eq!(q.enqueue_with_id_at(id.clone(), message("hi"), 0), id);
        assert_eq!(q.claim_next_due_at(0).unwrap().id, id);
    }

    #[test]
    fn test_claim_marks_in_flight_in_due_order() {
        let mut q = queue(3);
        let first = q.enqueue_at(message("a"), 0);
        let second = q.enqueue_at(message("b"), 0);

        assert_eq!(q.claim_next_due_at(0).unwrap().id, first);
        assert_eq!(q.claim_next_due_at(0).unwrap().id, second);
        assert!(q.claim_next_due_at(0).is_none());

        let snapshot = q.snapshot();
        assert_eq!(snapshot.in_flight, 2);
        assert_eq!(snapshot.backlog, 2);
    }

    #[test]
    fn test_claim_skips_jobs_not_yet_due() {
        let mut q = queue(3);
        q.enqueue_at(message("later"), 5_000);
        assert!(q.claim_next_due_at(4_999).is_none());
        assert!(q.claim_next_due_at(5_000).is_some());
    }

    #[test]
    fn test_success_removes_job() {
        let mut q = queue(3);
        let id = q.enqueue_at(message("a"), 0);
        q.claim_next_due_at(0);
        q.record_success(&id).unwrap();

        assert!(q.job(&id).is_none());
        let snapshot = q.snapshot();
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.backlog, 0);
    }

    #[test]
    fn test_record_requires_in_flight() {
        let mut q = queue(3);
        let id = q.enqueue_at(message("a"), 0);

        assert!(matches!(q.record_success(&id), Err(OpsError::NotFound(_))));
        assert!(matches!(
            q.record_failure_at("out_missing", "x", 0),
            Err(OpsError::NotFound(_))
        ));
    }

    #[test]
    fn test_backoff_scenario_dead_letters_on_fourth_failure() {
        // max_attempts=3, backoff 1s * 2^n capped at 8s.
        let mut q = queue(3);
        let id = q.enqueue_at(message("a"), 0);

        let mut now = 0;
        let mut gaps = Vec::new();
        for _ in 0..3 {
            let job = q.claim_next_due_at(now).unwrap();
            assert_eq!(job.id, id);
            let status = q.record_failure_at(&id, "boom", now).unwrap();
            assert_eq!(status, JobStatus::Pending);

            let next = q.job(&id).unwrap().next_attempt_at;
            gaps.push((next - now) / 1000);
            now = next;
        }
        assert_eq!(gaps, vec![1, 2, 4]);

        q.claim_next_due_at(now).unwrap();
        let status = q.record_failure_at(&id, "boom", now).unwrap();
        assert_eq!(status, JobStatus::DeadLettered);

        let dead = q.list_dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].attempt_count, 4);
        assert_eq!(dead[0].last_error.as_deref(), Some("boom"));
        assert!(q.claim_next_due_at(u64::MAX).is_none());
    }

    #[test]
    fn test_zero_max_attempts_dead_letters_immediately() {
        let mut q = queue(0);
        let id = q.enqueue_at(message("a"), 0);
        q.claim_next_due_at(0);

        assert_eq!(
            q.record_failure_at(&id, "nope", 0).unwrap(),
            JobStatus::DeadLettered
        );
    }

    #[test]
    fn test_replay_resets_dead_letter() {
        let mut q = queue(0);
        let id = q.enqueue_at(message("a"), 0);
        q.claim_next_due_at(0);
        q.record_failure_at(&id, "nope", 0).unwrap();

        let job = q.replay_at(&id, 10_000).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempt_count, 0);
        assert_eq!(job.next_attempt_at, 10_000);
        assert!(job.last_error.is_none());
        assert!(q.list_dead_letters().is_empty());
        assert_eq!(q.claim_next_due_at(10_000).unwrap().id, id);
    }

    #[test]
    fn test_replay_rejects_non_dead_letters() {
        let mut q = queue(3);
        let pending = q.enqueue_at(message("a"), 0);

        assert!(matches!(q.replay(&pending), Err(OpsError::NotFound(_))));
        assert!(matches!(q.replay("out_unknown"), Err(OpsError::NotFound(_))));

        q.claim_next_due_at(0);
        q.record_success(&pending).unwrap();
        assert!(matches!(q.replay(&pending), Err(OpsError::NotFound(_))));
    }

    #[test]
    fn test_clear_dead_letters_keeps_live_jobs() {
        let mut q = queue(0);
        let dead = q.enqueue_at(message("dead"), 0);
        q.claim_next_due_at(0);
        q.record_failure_at(&dead, "x", 0).unwrap();
        let live = q.enqueue_at(message("live"), 0);

        assert_eq!(q.clear_dead_letters(), 1);
        assert!(q.job(&dead).is_none());
        assert!(q.job(&live).is_some());
    }

    #[test]
    fn test_dead_letters_listed_in_order() {
        let mut q = queue(0);
        let a = q.enqueue_at(message("a"), 0);
        let b = q.enqueue_at(message("b"), 0);

        q.claim_next_due_at(0);
        q.claim_next_due_at(0);
        q.record_failure_at(&b, "x", 10).unwrap();
        q.record_failure_at(&a, "x", 20).unwrap();

        let ids: Vec<JobId> = q.list_dead_letters().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![b, a]);
    }
}
