//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vyral_api::{create_router, metrics, ApiConfig, AppState, OperationCatalog};
use vyral_cache::{CacheConfig, CacheStore, MemoryCache, RedisCache};
use vyral_orchestrator::{Orchestrator, OrchestratorConfig};
use vyral_providers::ProviderConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Required for rustls 0.23+
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing()?;

    info!("Starting vyral-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);
    if !config.has_worker_secret() {
        warn!("VYRAL_WORKER_SECRET is not set; every operation request will be rejected");
    }

    let cache = build_cache(&CacheConfig::from_env())?;
    info!(backend = cache.name(), "Result cache ready");

    let orchestrator = Orchestrator::new(cache, &OrchestratorConfig::from_env())
        .context("Failed to build webhook client")?;
    let catalog = OperationCatalog::from_providers(&ProviderConfig::from_env())
        .context("Failed to build provider clients")?;

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let state = AppState::new(config.clone(), orchestrator, catalog);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log filter")?;

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

/// Redis when `REDIS_URL` is set, otherwise an in-process cache.
fn build_cache(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    if config.redis_url.is_some() {
        let cache = RedisCache::from_config(config).context("Failed to create Redis cache")?;
        Ok(Arc::new(cache))
    } else {
        warn!("REDIS_URL not set, using in-process cache");
        Ok(Arc::new(MemoryCache::new()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
