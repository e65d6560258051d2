//! Response DTOs for the channel ops API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::audit::{AuditRecord, AuditStats};
use crate::cache::CacheStats;
use crate::clock::{current_timestamp_ms, to_rfc3339};
use crate::channels::MaintenanceState;
use crate::queue::{JobId, QueueSnapshot, RetryJob};

/// Response body for channel event ingestion.
///
/// This is also the value stored in the idempotency cache, so a duplicate
/// delivery of the same event returns the original reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub channel: String,
    pub reply: String,
    /// True when served from the idempotency cache
    pub duplicate: bool,
    pub outbound_job_id: Option<JobId>,
    /// ISO 8601 time the event was first processed
    pub processed_at: String,
}

/// Cache stats with the derived hit rate.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" while dead letters are waiting
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub queue: QueueSnapshot,
    pub cache: CacheStatsResponse,
    pub audit: AuditStats,
}

impl HealthResponse {
    pub fn new(queue: QueueSnapshot, cache: CacheStats, audit: AuditStats) -> Self {
        let status = if queue.dead_lettered > 0 {
            "degraded"
        } else {
            "healthy"
        };
        Self {
            status: status.to_string(),
            timestamp: to_rfc3339(current_timestamp_ms()),
            queue,
            cache: cache.into(),
            audit,
        }
    }
}

/// Response body for admin clear operations.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
    pub audit_id: u64,
}

/// Response body for `GET /api/v1/admin/audit`
#[derive(Debug, Clone, Serialize)]
pub struct AuditListResponse {
    pub count: usize,
    pub records: Vec<AuditRecord>,
}

impl AuditListResponse {
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

/// Response body for a maintenance toggle.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    #[serde(flatten)]
    pub state: MaintenanceState,
    pub audit_id: u64,
}

/// Response body for `GET /api/v1/admin/outbound/dead-letters`
#[derive(Debug, Clone, Serialize)]
pub struct DeadLettersResponse {
    pub count: usize,
    pub jobs: Vec<RetryJob>,
}

impl DeadLettersResponse {
    pub fn new(jobs: Vec<RetryJob>) -> Self {
        Self {
            count: jobs.len(),
            jobs,
        }
    }
}

/// Response body for a dead-letter replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResponse {
    pub job: RetryJob,
    pub audit_id: u64,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_response_survives_cache_value() {
        let resp = IngestResponse {
            channel: "slack".to_string(),
            reply: "Received: hi".to_string(),
            duplicate: false,
            outbound_job_id: Some("out_1".to_string()),
            processed_at: "2026-01-01T00:00:00+00:00".to_string(),
        };
        let value = serde_json::to_value(&resp).unwrap();
        let back: IngestResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_cache_stats_flattened_with_hit_rate() {
        let mut stats = CacheStats::new(10, 60);
        stats.record_hit();
        stats.record_miss();
        let json = serde_json::to_value(CacheStatsResponse::from(stats)).unwrap();

        assert_eq!(json["max_size"], 10);
        assert_eq!(json["hit_rate"], 0.5);
    }

    #[test]
    fn test_health_degraded_with_dead_letters() {
        let audit = AuditStats {
            size: 0,
            max_size: 10,
            oldest_id: None,
            newest_id: None,
        };
        let healthy = HealthResponse::new(QueueSnapshot::default(), CacheStats::new(1, 1), audit.clone());
        assert_eq!(healthy.status, "healthy");

        let queue = QueueSnapshot {
            dead_lettered: 2,
            ..QueueSnapshot::default()
        };
        let degraded = HealthResponse::new(queue, CacheStats::new(1, 1), audit);
        assert_eq!(degraded.status, "degraded");
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
