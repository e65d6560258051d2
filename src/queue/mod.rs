//! Queue Module
//!
//! Outbound retry queue with exponential backoff and dead-lettering.

mod backoff;
mod job;
mod sender;
mod store;


pub use backoff::BackoffPolicy;
pub use job::{new_job_id, JobId, JobStatus, OutboundMessage, RetryJob};
pub use sender::{DeliveryError, LogSender, OutboundSender, WebhookSender};
pub use store::{QueueSnapshot, RetryQueue};
