//! API Handlers
//!
//! Shared state plus the public endpoints: health and channel ingestion.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info};

use crate::audit::AuditLog;
use crate::cache::{IdempotencyCache, KeyLocks};
use crate::channels::{AckProcessor, EventProcessor, MaintenanceRegistry};
use crate::clock::{current_timestamp_ms, to_rfc3339};
use crate::config::Config;
use crate::error::{OpsError, Result};
use crate::models::{validate_idempotency_key, ChannelEventRequest, HealthResponse, IngestResponse};
use crate::queue::{new_job_id, RetryQueue};

/// Header carrying the idempotency key; wins over the body field.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Application state shared across all handlers.
///
/// Each component sits behind its own lock; no handler holds two locks at once.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RwLock<IdempotencyCache>>,
    pub audit: Arc<RwLock<AuditLog>>,
    pub queue: Arc<RwLock<RetryQueue>>,
    pub maintenance: Arc<RwLock<MaintenanceRegistry>>,
    pub processor: Arc<dyn EventProcessor>,
    /// Wakes the delivery worker after an enqueue or replay
    pub delivery_waker: Arc<Notify>,
    /// Idempotency keys currently being processed
    pub ingest_locks: KeyLocks,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Creates state from already-built components.
    pub fn new(cache: IdempotencyCache, audit: AuditLog, queue: RetryQueue) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            audit: Arc::new(RwLock::new(audit)),
            queue: Arc::new(RwLock::new(queue)),
            maintenance: Arc::new(RwLock::new(MaintenanceRegistry::new())),
            processor: Arc::new(AckProcessor),
            delivery_waker: Arc::new(Notify::new()),
            ingest_locks: KeyLocks::new(),
            admin_token: None,
        }
    }

    /// Creates state with every component sized from the Config.
    ///
    /// The Config is validated first, so an invalid capacity or TTL never
    /// reaches a component constructor.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let state = Self::new(
            IdempotencyCache::new(config.cache_max_entries, config.cache_ttl_seconds),
            AuditLog::new(config.audit_max_entries),
            RetryQueue::new(config.retry_max_attempts, config.backoff()),
        );
        Ok(match &config.admin_token {
            Some(token) => state.with_admin_token(token.as_str()),
            None => state,
        })
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(Arc::from(token));
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn EventProcessor>) -> Self {
        self.processor = processor;
        self
    }
}

/// Handler for GET /health
///
/// Read-only view of the queue, cache and audit log.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let queue = state.queue.read().await.snapshot();
    let cache = state.cache.read().await.stats();
    let audit = state.audit.read().await.stats();

    Json(HealthResponse::new(queue, cache, audit))
}

/// Handler for POST /api/v1/channels/:channel/events
///
/// Rejects events for channels in maintenance, answers duplicates from the
/// idempotency cache, and otherwise processes the event, caches the response
/// and enqueues the outbound reply, in that order.
///
/// Concurrent requests with the same key are serialized on that key: the
/// first is processed, the rest wait and are answered from the cache.
pub async fn ingest_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ChannelEventRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(OpsError::InvalidRequest(error_msg));
    }

    if state.maintenance.read().await.is_enabled(&channel) {
        return Err(OpsError::Maintenance(channel));
    }

    let header_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|v| {
            v.to_str()
                .map(str::to_string)
                .map_err(|_| OpsError::InvalidRequest("Idempotency key must be ASCII".to_string()))
        })
        .transpose()?;
    if let Some(error_msg) = header_key.as_deref().and_then(validate_idempotency_key) {
        return Err(OpsError::InvalidRequest(error_msg));
    }
    // Keys are scoped per channel so two channels cannot collide.
    let cache_key = header_key
        .or_else(|| req.idempotency_key.clone())
        .map(|key| format!("{}:{}", channel, key));

    // Held until the response is cached and the reply enqueued.
    let _reservation = match &cache_key {
        Some(key) => Some(state.ingest_locks.lock(key).await),
        None => None,
    };

    if let Some(key) = &cache_key {
        let cached = state.cache.write().await.get(key);
        if let Some(value) = cached {
            let mut response: IngestResponse = serde_json::from_value(value)
                .map_err(|e| OpsError::Internal(format!("Corrupt cached response: {}", e)))?;
            response.duplicate = true;
            info!(channel = %channel, key = %key, "Duplicate event served from cache");
            return Ok(Json(response));
        }
    }

    let event = req.into_event();
    let processed = state.processor.process(&channel, &event).await?;

    let outbound = processed.outbound.map(|message| (new_job_id(), message));
    let response = IngestResponse {
        channel: channel.clone(),
        reply: processed.reply,
        duplicate: false,
        outbound_job_id: outbound.as_ref().map(|(id, _)| id.clone()),
        processed_at: to_rfc3339(current_timestamp_ms()),
    };

    if let Some(key) = cache_key {
        let value = serde_json::to_value(&response)
            .map_err(|e| OpsError::Internal(format!("Could not cache response: {}", e)))?;
        state.cache.write().await.put(key, value);
    }

    if let Some((id, message)) = outbound {
        state.queue.write().await.enqueue_with_id(id, message);
        state.delivery_waker.notify_one();
    }

    debug!(channel = %channel, user = %event.user_id, "Event processed");
    Ok(Json(response))
}
