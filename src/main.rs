//! Trailhead Cache - tiered response cache for a CMS-backed blog
//!
//! Hosts the shared store, the invalidation trigger and the CMS proxy.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailhead_cache::api::{create_router, AppState};
use trailhead_cache::cache::{load_snapshot, save_snapshot, SharedStore};
use trailhead_cache::{spawn_sweep_task, Config};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Restore the shared store snapshot, if configured
/// 4. Start the expired-entry sweep, if configured
/// 5. Serve the router until SIGINT/SIGTERM
/// 6. Save the shared store snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailhead_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Trailhead cache service");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        ttl_ms = config.cache_ttl_ms,
        remote_store = config.shared_store_url.as_deref().unwrap_or("in-process"),
        edge_purge = config.edge_purge_url.is_some(),
        sweep_secs = config.sweep_interval,
        "Configuration loaded"
    );
    if config.invalidation_secret.is_none() {
        warn!("INVALIDATION_SECRET is not set, /invalidate will reject every call");
    }

    let mut store = SharedStore::new();
    if let Some(path) = &config.snapshot_path {
        if let Some(snapshot) = load_snapshot(path)
            .await
            .with_context(|| format!("loading snapshot from {}", path))?
        {
            let restored = store.restore(snapshot);
            info!(restored, path = %path, "Shared store restored from snapshot");
        }
    }

    let state = AppState::from_config(&config, store).context("building application state")?;

    let sweep_handle = (config.sweep_interval > 0).then(|| {
        spawn_sweep_task(
            state.store.clone(),
            Duration::from_secs(config.sweep_interval),
        )
    });

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("serving HTTP")?;

    if let Some(path) = &config.snapshot_path {
        let snapshot = state.store.read().await.snapshot();
        save_snapshot(path, &snapshot)
            .await
            .with_context(|| format!("saving snapshot to {}", path))?;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep.
async fn shutdown_signal(sweep_handle: Option<JoinHandle<()>>) {
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

    if let Some(handle) = sweep_handle {
        handle.abort();
        info!("Sweep task stopped");
    }
}
