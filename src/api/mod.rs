//! API Module
//!
//! HTTP handlers and routing for the channel ops REST API.
//!
//! # Endpoints
//! - `GET /health` - Queue, cache and audit health
//! - `POST /api/v1/channels/:channel/events` - Ingest a channel event
//! - `/api/v1/admin/*` - Admin surface, gated by token and role headers

pub mod admin;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
