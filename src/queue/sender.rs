//! Outbound senders used by the delivery worker.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::queue::OutboundMessage;

/// A failed delivery attempt. Recorded on the job, never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The downstream answered but refused the message
    #[error("rejected: {0}")]
    Rejected(String),

    /// The downstream could not be reached
    #[error("transport: {0}")]
    Transport(String),

    /// The attempt did not finish within the per-attempt timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers an outbound message to its channel.
///
/// Implementations must be `Send + Sync` for use from the delivery worker.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    /// Sends one message and returns a delivery receipt.
    async fn send(&self, message: &OutboundMessage) -> Result<String, DeliveryError>;
}

/// Logs each message and acknowledges it. Used when no webhook is configured.
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl OutboundSender for LogSender {
    async fn send(&self, message: &OutboundMessage) -> Result<String, DeliveryError> {
        info!(
            channel = %message.channel,
            channel_id = %message.channel_id,
            thread_id = message.thread_id.as_deref().unwrap_or("-"),
            "Outbound message: {}",
            message.text
        );
        Ok(format!("sent:{}:{}", message.channel, message.channel_id))
    }
}

/// POSTs each message as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl OutboundSender for WebhookSender {
    async fn send(&self, message: &OutboundMessage) -> Result<String, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(format!("sent:{}", status.as_u16()))
        } else {
            Err(DeliveryError::Rejected(format!("HTTP {}", status.as_u16())))
        }
    }
}
