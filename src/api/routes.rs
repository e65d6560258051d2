//! API Routes
//!
//! Configures the Axum router with the public and admin endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::admin::{
    audit_clear_handler, audit_list_handler, audit_stats_handler, cache_clear_handler,
    cache_stats_handler, dead_letters_clear_handler, dead_letters_handler,
    maintenance_list_handler, maintenance_set_handler, queue_snapshot_handler, replay_handler,
};
use super::handlers::{health_handler, ingest_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `POST /api/v1/channels/:channel/events` - Ingest a channel event
/// - `/api/v1/admin/...` - See [`admin_router`]
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/channels/:channel/events", post(ingest_handler))
        .nest("/api/v1/admin", admin_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin endpoints. Authorization happens in the `AdminIdentity` extractor
/// and the per-handler role check.
fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/clear", post(cache_clear_handler))
        .route("/audit", get(audit_list_handler))
        .route("/audit/stats", get(audit_stats_handler))
        .route("/audit/clear", post(audit_clear_handler))
        .route("/maintenance", get(maintenance_list_handler))
        .route("/maintenance/:channel", put(maintenance_set_handler))
        .route("/outbound/queue", get(queue_snapshot_handler))
        .route(
            "/outbound/dead-letters",
            get(dead_letters_handler).delete(dead_letters_clear_handler),
        )
        .route("/outbound/dead-letters/:id/replay", post(replay_handler))
}
