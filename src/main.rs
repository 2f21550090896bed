//! callcache - Call-tracked key/value cache server
//!
//! Thin HTTP front end over the instrumented cache and the expiring fetch cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callcache::api::{create_router, AppState};
use callcache::store::{MemoryStore, SharedStore};
use callcache::{spawn_cleanup_task, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the backing store (Redis if configured, memory otherwise)
/// 4. Build the caches (this clears the store)
/// 5. Start the TTL sweep for the memory store
/// 6. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting callcache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis={}, fetch_ttl={}s, fetch_dedup={}, port={}",
        config.redis_url.as_deref().unwrap_or("none"),
        config.fetch_ttl,
        config.fetch_dedup,
        config.server_port
    );

    let (store, cleanup_handle) = open_store(&config).await?;

    let state = AppState::from_config(store, &config)
        .await
        .context("failed to initialize caches")?;
    info!("Caches initialized on {} store", state.store_name);

    let app = create_router(state);

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

/// Opens the configured backing store, starting the sweep task for memory.
async fn open_store(config: &Config) -> anyhow::Result<(SharedStore, Option<JoinHandle<()>>)> {
    if let Some(url) = &config.redis_url {
        return open_redis(url).await.map(|store| (store, None));
    }

    let memory = Arc::new(MemoryStore::new());
    let handle = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
    info!("Using in-memory store");

    let store: SharedStore = memory;
    Ok((store, Some(handle)))
}

#[cfg(feature = "redis")]
async fn open_redis(url: &str) -> anyhow::Result<SharedStore> {
    let store: SharedStore = Arc::new(
        callcache::store::RedisStore::connect(url)
            .await
            .context("failed to connect to Redis")?,
    );
    Ok(store)
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_url: &str) -> anyhow::Result<SharedStore> {
    anyhow::bail!("REDIS_URL is set but this build lacks the `redis` feature")
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
