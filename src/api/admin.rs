//! Admin API Handlers
//!
//! Every handler checks the caller's role first. Mutations append an audit
//! record right after the state change succeeds.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::json;
use tracing::info;

use crate::api::AppState;
use crate::audit::{AuditStats, Role};
use crate::auth::AdminIdentity;
use crate::channels::MaintenanceState;
use crate::error::Result;
use crate::models::{
    AuditListResponse, AuditQuery, CacheStatsResponse, ClearResponse, DeadLettersResponse,
    MaintenanceRequest, MaintenanceResponse, ReplayResponse,
};
use crate::queue::QueueSnapshot;

pub const CACHE_CLEAR_ACTION: &str = "idempotency_cache_clear";
pub const MAINTENANCE_TOGGLE_ACTION: &str = "maintenance_toggle";
pub const DEAD_LETTER_REPLAY_ACTION: &str = "dead_letter_replay";
pub const DEAD_LETTER_CLEAR_ACTION: &str = "dead_letter_clear";

/// GET /api/v1/admin/cache/stats (viewer)
pub async fn cache_stats_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<CacheStatsResponse>> {
    identity.require(Role::Viewer)?;
    let stats = state.cache.read().await.stats();
    Ok(Json(stats.into()))
}

/// POST /api/v1/admin/cache/clear (admin)
pub async fn cache_clear_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>> {
    identity.require(Role::Admin)?;

    let cleared = state.cache.write().await.clear();
    let record = state.audit.write().await.append(
        &identity.actor,
        identity.role,
        CACHE_CLEAR_ACTION,
        "idempotency_cache",
        json!({ "cleared": cleared }),
    );

    info!(actor = %identity.actor, cleared, "Idempotency cache cleared");
    Ok(Json(ClearResponse {
        cleared,
        audit_id: record.id,
    }))
}

/// GET /api/v1/admin/audit (viewer)
pub async fn audit_list_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
    query: std::result::Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditListResponse>> {
    identity.require(Role::Viewer)?;
    let Query(query) = query?;
    let records = state.audit.read().await.list(&query.into());
    Ok(Json(AuditListResponse::new(records)))
}

/// GET /api/v1/admin/audit/stats (viewer)
pub async fn audit_stats_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<AuditStats>> {
    identity.require(Role::Viewer)?;
    Ok(Json(state.audit.read().await.stats()))
}

/// POST /api/v1/admin/audit/clear (admin)
///
/// The clear is recorded as the first entry of the emptied log.
pub async fn audit_clear_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>> {
    identity.require(Role::Admin)?;

    let (cleared, record) = {
        let mut audit = state.audit.write().await;
        let cleared = audit.len();
        (cleared, audit.clear(&identity.actor, identity.role))
    };

    info!(actor = %identity.actor, cleared, "Audit log cleared");
    Ok(Json(ClearResponse {
        cleared,
        audit_id: record.id,
    }))
}

/// GET /api/v1/admin/maintenance (viewer)
pub async fn maintenance_list_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<MaintenanceState>>> {
    identity.require(Role::Viewer)?;
    Ok(Json(state.maintenance.read().await.list()))
}

/// PUT /api/v1/admin/maintenance/:channel (admin)
pub async fn maintenance_set_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
    Path(channel): Path<String>,
    payload: std::result::Result<Json<MaintenanceRequest>, JsonRejection>,
) -> Result<Json<MaintenanceResponse>> {
    identity.require(Role::Admin)?;
    let Json(req) = payload?;

    let maintenance = state.maintenance.write().await.set(
        &channel,
        req.enabled,
        req.reason.clone(),
        &identity.actor,
    );
    let record = state.audit.write().await.append(
        &identity.actor,
        identity.role,
        MAINTENANCE_TOGGLE_ACTION,
        &channel,
        json!({ "enabled": req.enabled, "reason": req.reason }),
    );

    info!(actor = %identity.actor, channel = %channel, enabled = req.enabled, "Maintenance mode changed");
    Ok(Json(MaintenanceResponse {
        state: maintenance,
        audit_id: record.id,
    }))
}

/// GET /api/v1/admin/outbound/queue (viewer)
pub async fn queue_snapshot_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<QueueSnapshot>> {
    identity.require(Role::Viewer)?;
    Ok(Json(state.queue.read().await.snapshot()))
}

/// GET /api/v1/admin/outbound/dead-letters (viewer)
pub async fn dead_letters_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<DeadLettersResponse>> {
    identity.require(Role::Viewer)?;
    let jobs = state.queue.read().await.list_dead_letters();
    Ok(Json(DeadLettersResponse::new(jobs)))
}

/// POST /api/v1/admin/outbound/dead-letters/:id/replay (approver)
pub async fn replay_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ReplayResponse>> {
    identity.require(Role::Approver)?;

    let job = state.queue.write().await.replay(&job_id)?;
    state.delivery_waker.notify_one();

    let record = state.audit.write().await.append(
        &identity.actor,
        identity.role,
        DEAD_LETTER_REPLAY_ACTION,
        &job_id,
        json!({ "channel": job.payload.channel }),
    );

    info!(actor = %identity.actor, job_id = %job_id, "Dead letter replayed");
    Ok(Json(ReplayResponse {
        job,
        audit_id: record.id,
    }))
}

/// DELETE /api/v1/admin/outbound/dead-letters (admin)
pub async fn dead_letters_clear_handler(
    identity: AdminIdentity,
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>> {
    identity.require(Role::Admin)?;

    let cleared = state.queue.write().await.clear_dead_letters();
    let record = state.audit.write().await.append(
        &identity.actor,
        identity.role,
        DEAD_LETTER_CLEAR_ACTION,
        "outbound_dead_letters",
        json!({ "cleared": cleared }),
    );

    info!(actor = %identity.actor, cleared, "Dead letters cleared");
    Ok(Json(ClearResponse {
        cleared,
        audit_id: record.id,
    }))
}
