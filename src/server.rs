//! Process bootstrap for the API server and the analytics worker.
//!
//! Builds every backend handle once and injects it explicitly; nothing is
//! held in globals.

use crate::application::services::{LinkService, StatsService};
use crate::config::Config;
use crate::domain::click_emitter::ClickEmitter;
use crate::domain::click_worker::ClickAggregator;
use crate::domain::id_allocator::BlockAllocator;
use crate::domain::repositories::{ClickCounterRepository, LinkRepository};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{MIGRATOR, PgClickCounterRepository, PgLinkRepository};
use crate::infrastructure::sequence::RedisSequenceStore;
use crate::infrastructure::stream::{RedisClickStream, RedisStreamConnector};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Opens the PostgreSQL pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;
    tracing::info!("Migrations applied");

    Ok(pool)
}

/// Connects the resolution cache, degrading to [`NullCache`] when Redis is
/// unreachable.
async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    match RedisCache::connect(&config.redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis cache: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Connects the click emitter. Emission is disabled, not fatal, when the
/// stream cannot be reached.
async fn connect_emitter(config: &Config) -> ClickEmitter {
    match RedisClickStream::connect(&config.stream_url, config.click_stream_maxlen).await {
        Ok(stream) => {
            tracing::info!(
                "Click emission enabled ({} shard(s) of {})",
                config.click_stream_shards,
                config.click_stream
            );
            ClickEmitter::new(
                Arc::new(stream),
                config.click_stream.clone(),
                config.click_stream_shards,
            )
        }
        Err(e) => {
            tracing::warn!("Click stream unavailable: {}. Clicks will not be recorded.", e);
            ClickEmitter::disabled()
        }
    }
}

/// Builds the API server state from configuration.
///
/// # Errors
///
/// Returns an error if the database or the sequence store is unreachable.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let pool = Arc::new(connect_database(config).await?);

    let sequence = RedisSequenceStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to sequence store")?;
    let allocator = Arc::new(BlockAllocator::new(
        Arc::new(sequence),
        config.id_sequence_key.clone(),
        config.id_block_size,
        config.store_timeout(),
    ));

    let cache = connect_cache(config).await;
    let click_emitter = connect_emitter(config).await;

    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let counters: Arc<dyn ClickCounterRepository> =
        Arc::new(PgClickCounterRepository::new(pool));

    let link_service = Arc::new(LinkService::new(
        allocator,
        link_repository.clone(),
        cache.clone(),
        config.cache_ttl(),
        config.store_timeout(),
    ));
    let stats_service = Arc::new(StatsService::new(counters, config.store_timeout()));

    Ok(AppState::new(
        link_service,
        stats_service,
        click_emitter,
        cache,
        link_repository,
        config.base_url.clone(),
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if bootstrap fails, the address cannot be bound, or the
/// server stops with an I/O error.
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Runs the analytics worker over every configured shard until a shutdown
/// signal arrives or a shard gives up reconnecting.
///
/// # Errors
///
/// Returns an error if bootstrap fails or a shard exhausts its retries.
pub async fn run_worker(config: Config) -> Result<()> {
    let consumer_name = config.click_consumer_name.clone();
    let shards = config.shard_names();

    let pool = Arc::new(connect_database(&config).await?);
    let counters: Arc<dyn ClickCounterRepository> =
        Arc::new(PgClickCounterRepository::new(pool));

    let connector = Arc::new(RedisStreamConnector::new(
        config.stream_url.clone(),
        config.click_consumer_group.clone(),
        consumer_name.clone(),
    ));

    let aggregator = Arc::new(ClickAggregator::new(
        connector,
        counters,
        config.retry_policy(),
        config.store_timeout(),
    ));

    tracing::info!(
        "Analytics worker {} consuming {:?} as group {}",
        consumer_name,
        shards,
        config.click_consumer_group
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    aggregator.run(shards, shutdown_rx).await?;

    tracing::info!("Analytics worker stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
