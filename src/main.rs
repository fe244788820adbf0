//! Meter Cache - caching reverse proxy
//!
//! Serves the cache admin plane and forwards everything else to the upstream
//! CRUD service through the response cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meter_cache::{
    cache::MemoryStore, create_router, spawn_cleanup_task, upstream::proxy_handler, AppState,
    CachePolicy, CacheService, Config, UpstreamClient,
};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the in-memory store and start the TTL cleanup task
/// 4. Build the policy and the upstream client
/// 5. Create the router (admin routes + upstream fallback behind the cache)
/// 6. Optionally warm the cache
/// 7. Serve until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meter_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Meter Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, port={}, cleanup_interval={}s, upstream={}",
        config.max_entries,
        config.default_ttl,
        config.server_port,
        config.cleanup_interval,
        config.upstream_url
    );

    let store = MemoryStore::new(config.max_entries);
    let cleanup_handle = spawn_cleanup_task(Arc::new(store.clone()), config.cleanup_interval);
    info!("Background cleanup task started");

    let policy = Arc::new(
        CachePolicy::new(config.default_ttl, config.health_threshold)
            .with_connection_limit(config.connection_limit),
    );
    let upstream = UpstreamClient::new(config.upstream_url.clone(), config.upstream_timeout)
        .context("failed to create upstream client")?;

    let state = AppState::new(CacheService::from_backend(store), policy)
        .with_warmup_source(Arc::new(upstream.clone()));

    let fallback = Router::new()
        .fallback(proxy_handler)
        .with_state(upstream);
    let app = create_router(state.clone(), fallback);

    if config.warmup_on_start {
        match state.admin().warmup().await {
            Ok(warmed) => info!(warmed, "startup warmup finished"),
            Err(e) => warn!(error = %e, "startup warmup failed"),
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
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
                warn!(error = %e, "failed to install SIGTERM handler");
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
