//! Audit records and list filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::Role;

/// One administrative mutation. Immutable once appended.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditRecord {
    /// Monotonic sequence number, never reused
    pub id: u64,
    pub actor: String,
    pub role: Role,
    /// Action tag such as `idempotency_cache_clear`
    pub action: String,
    pub target: String,
    /// Unix milliseconds
    pub timestamp: u64,
    pub detail: Value,
}

/// Result ordering for [`crate::audit::AuditLog::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ListOrder {
    #[default]
    #[serde(rename = "desc")]
    NewestFirst,
    #[serde(rename = "asc")]
    OldestFirst,
}

/// Criteria for listing audit records. Unset fields match everything;
/// `since` and `until` are inclusive.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
    pub since: Option<u64>,
    pub until: Option<u64>,
    pub limit: Option<usize>,
    pub order: ListOrder,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.actor.as_deref().map_or(true, |a| record.actor == a)
            && self.action.as_deref().map_or(true, |a| record.action == a)
            && self.target.as_deref().map_or(true, |t| record.target == t)
            && self.since.map_or(true, |since| record.timestamp >= since)
            && self.until.map_or(true, |until| record.timestamp <= until)
    }
}

/// Size and id range of the audit log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditStats {
    pub size: usize,
    pub max_size: usize,
    pub oldest_id: Option<u64>,
    pub newest_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(actor: &str, action: &str, timestamp: u64) -> AuditRecord {
        AuditRecord {
            id: 1,
            actor: actor.to_string(),
            role: Role::Admin,
            action: action.to_string(),
            target: "cache".to_string(),
            timestamp,
            detail: Value::Null,
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(AuditFilter::default().matches(&record("a", "x", 5)));
    }

    #[test]
    fn test_filter_fields() {
        let filter = AuditFilter {
            actor: Some("root-admin".to_string()),
            action: Some("maintenance_toggle".to_string()),
            ..AuditFilter::default()
        };
        assert!(filter.matches(&record("root-admin", "maintenance_toggle", 0)));
        assert!(!filter.matches(&record("ops", "maintenance_toggle", 0)));
        assert!(!filter.matches(&record("root-admin", "dead_letter_replay", 0)));
    }

    #[test]
    fn test_time_range_inclusive() {
        let filter = AuditFilter {
            since: Some(10),
            until: Some(20),
            ..AuditFilter::default()
        };
        assert!(filter.matches(&record("a", "x", 10)));
        assert!(filter.matches(&record("a", "x", 20)));
        assert!(!filter.matches(&record("a", "x", 9)));
        assert!(!filter.matches(&record("a", "x", 21)));
    }

    #[test]
    fn test_order_deserialize() {
        let order: ListOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order, ListOrder::OldestFirst);
        assert_eq!(ListOrder::default(), ListOrder::NewestFirst);
    }
}
