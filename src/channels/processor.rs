//! Inbound event processing.
//!
//! Planning and execution of an event belong to the agent runtime; this
//! crate only needs a result to cache and an optional reply to deliver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, Result};
use crate::queue::OutboundMessage;

/// An inbound message from a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// What processing an event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    pub reply: String,
    pub outbound: Option<OutboundMessage>,
}

/// Turns an inbound channel event into a reply.
///
/// Called from request handlers, so implementations must not block the
/// runtime; push CPU-heavy work onto `tokio::task::spawn_blocking`.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, channel: &str, event: &ChannelEvent) -> Result<ProcessedEvent>;
}

/// Acknowledges every event with a reply on the same channel and thread.
#[derive(Debug, Default, Clone)]
pub struct AckProcessor;

#[async_trait]
impl EventProcessor for AckProcessor {
    async fn process(&self, channel: &str, event: &ChannelEvent) -> Result<ProcessedEvent> {
        let text = event.text.trim();
        if text.is_empty() {
            return Err(OpsError::InvalidRequest(
                "Event text cannot be empty".to_string(),
            ));
        }

        let reply = format!("Received: {}", text);
        Ok(ProcessedEvent {
            outbound: Some(OutboundMessage {
                channel: channel.to_string(),
                channel_id: event.channel_id.clone(),
                text: reply.clone(),
                thread_id: event.thread_id.clone(),
            }),
            reply,
        })
    }
}
