//! Channel Ops - operational plumbing for a chat channel gateway
//!
//! Serves the ingestion and admin API, sweeps the idempotency cache and runs
//! the outbound delivery worker.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_ops::api::create_router;
use channel_ops::queue::{LogSender, OutboundSender, WebhookSender};
use channel_ops::{spawn_cleanup_task, spawn_delivery_worker, AppState, Config};

/// Main entry point for the channel ops server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build shared state (cache, audit log, retry queue)
/// 4. Start the cache sweep and the delivery worker
/// 5. Serve HTTP until SIGINT/SIGTERM, then stop background tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "channel_ops=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Channel Ops server");

    let config = Config::from_env().context("invalid configuration")?;
    let state = AppState::from_config(&config).context("invalid configuration")?;
    info!(
        port = config.server_port,
        cache_max_entries = config.cache_max_entries,
        cache_ttl_seconds = config.cache_ttl_seconds,
        audit_max_entries = config.audit_max_entries,
        retry_max_attempts = config.retry_max_attempts,
        admin_api = config.admin_token.is_some(),
        "Configuration loaded"
    );
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set, admin API will reject every request");
    }

    let sender: Arc<dyn OutboundSender> = match &config.outbound_webhook_url {
        Some(url) => {
            info!(url = %url, "Delivering outbound messages to webhook");
            Arc::new(WebhookSender::new(url.as_str()))
        }
        None => {
            info!("OUTBOUND_WEBHOOK_URL is not set, outbound messages will be logged only");
            Arc::new(LogSender)
        }
    };

    let cleanup_handle = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval);
    let worker = spawn_delivery_worker(
        state.queue.clone(),
        sender,
        state.delivery_waker.clone(),
        config.delivery_poll_interval(),
        config.delivery_timeout(),
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
    worker.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
