//! Retry jobs and the outbound messages they carry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type JobId = String;

/// A reply to deliver back to a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub channel_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InFlight,
    Succeeded,
    DeadLettered,
}

/// An outbound delivery tracked by the retry queue.
#[derive(Debug, Clone, Serialize)]
pub struct RetryJob {
    pub id: JobId,
    pub payload: OutboundMessage,
    /// Failed delivery attempts so far
    pub attempt_count: u32,
    /// Unix milliseconds
    pub next_attempt_at: u64,
    pub status: JobStatus,
    pub created_at: u64,
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_lettered_at: Option<u64>,
    /// Enqueue order, used to break ties between equally due jobs
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl RetryJob {
    pub(crate) fn new(id: JobId, payload: OutboundMessage, sequence: u64, now_ms: u64) -> Self {
        Self {
            id,
            payload,
            attempt_count: 0,
            next_attempt_at: now_ms,
            status: JobStatus::Pending,
            created_at: now_ms,
            last_error: None,
            dead_lettered_at: None,
            sequence,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.status == JobStatus::Pending && self.next_attempt_at <= now_ms
    }
}

/// Generates a fresh `out_`-prefixed job id.
pub fn new_job_id() -> JobId {
    format!("out_{}", Uuid::new_v4().simple())
}
