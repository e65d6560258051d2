//! Request and Response models for the channel ops API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    validate_idempotency_key, AuditQuery, ChannelEventRequest, MaintenanceRequest,
    MAX_IDEMPOTENCY_KEY_LENGTH,
};
pub use responses::{
    AuditListResponse, CacheStatsResponse, ClearResponse, DeadLettersResponse, ErrorResponse,
    HealthResponse, IngestResponse, MaintenanceResponse, ReplayResponse,
};
