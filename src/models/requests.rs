//! Request DTOs for the channel ops API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::audit::{AuditFilter, ListOrder};
use crate::channels::ChannelEvent;

/// Maximum accepted idempotency key length in bytes
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 256;

/// Request body for `POST /api/v1/channels/:channel/events`
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEventRequest {
    /// Deduplication key; the `Idempotency-Key` header takes precedence
    #[serde(default)]
    pub idempotency_key: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChannelEventRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() {
            return Some("channel_id cannot be empty".to_string());
        }
        if self.user_id.trim().is_empty() {
            return Some("user_id cannot be empty".to_string());
        }
        if let Some(key) = &self.idempotency_key {
            return validate_idempotency_key(key);
        }
        None
    }

    pub fn into_event(self) -> ChannelEvent {
        ChannelEvent {
            channel_id: self.channel_id,
            user_id: self.user_id,
            text: self.text,
            thread_id: self.thread_id,
        }
    }
}

/// Checks an idempotency key from either the header or the body.
pub fn validate_idempotency_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Idempotency key cannot be empty".to_string());
    }
    if key.len() > MAX_IDEMPOTENCY_KEY_LENGTH {
        return Some(format!(
            "Idempotency key exceeds maximum length of {} bytes",
            MAX_IDEMPOTENCY_KEY_LENGTH
        ));
    }
    None
}

/// Request body for `PUT /api/v1/admin/maintenance/:channel`
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceRequest {
    pub enabled: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string for `GET /api/v1/admin/audit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
    /// Inclusive lower bound, Unix milliseconds
    pub since: Option<u64>,
    /// Inclusive upper bound, Unix milliseconds
    pub until: Option<u64>,
    pub limit: Option<usize>,
    /// `desc` (newest first, default) or `asc`
    pub order: Option<ListOrder>,
}

impl From<AuditQuery> for AuditFilter {
    fn from(query: AuditQuery) -> Self {
        AuditFilter {
            actor: query.actor,
            action: query.action,
            target: query.target,
            since: query.since,
            until: query.until,
            limit: query.limit,
            order: query.order.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: Option<&str>) -> ChannelEventRequest {
        ChannelEventRequest {
            idempotency_key: key.map(str::to_string),
            channel_id: "C1".to_string(),
            user_id: "U1".to_string(),
            text: "hello".to_string(),
            thread_id: None,
        }
    }

    #[test]
    fn test_event_request_deserialize() {
        let json = r#"{"channel_id":"C1","user_id":"U1","text":"hi","idempotency_key":"evt-1"}"#;
        let req: ChannelEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.idempotency_key.as_deref(), Some("evt-1"));
        assert!(req.thread_id.is_none());
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(request(Some("evt-1")).validate().is_none());
        assert!(request(None).validate().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_key() {
        assert!(request(Some("")).validate().is_some());
        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LENGTH + 1);
        assert!(request(Some(&long)).validate().is_some());
    }

    #[test]
    fn test_validate_rejects_blank_ids() {
        let mut req = request(None);
        req.channel_id = " ".to_string();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_audit_query_into_filter() {
        let query = AuditQuery {
            actor: Some("root-admin".to_string()),
            order: Some(ListOrder::OldestFirst),
            limit: Some(5),
            ..AuditQuery::default()
        };
        let filter: AuditFilter = query.into();
        assert_eq!(filter.actor.as_deref(), Some("root-admin"));
        assert_eq!(filter.order, ListOrder::OldestFirst);
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn test_maintenance_request_reason_optional() {
        let req: MaintenanceRequest = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(req.enabled);
        assert!(req.reason.is_none());
    }
}
