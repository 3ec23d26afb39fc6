//! Folio API Server Entry Point
//!
//! Loads configuration, connects Postgres, Redis and the object store,
//! makes sure the schema exists and serves the router until Ctrl-C or
//! SIGTERM.

use std::sync::Arc;

use folio_api::telemetry::{init_tracer, TelemetryConfig};
use folio_api::{
    create_api_router, resolve_bind_addr, ApiConfig, ApiError, ApiResult, AppState, AuthConfig,
    CacheProbe, DatabaseProbe, DbClient, DbConfig, HealthState, PgArticleStore, PgUserStore,
    ReadinessProbe,
};
use folio_core::Article;
use folio_storage::{
    CacheBackend, CacheConfig, CachedStore, ImageBucket, ObjectStoreConfig, ReadThroughCache,
    RedisCacheBackend, RedisConfig, Store,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // A missing .env file is normal outside local development.
    let dotenv = dotenvy::dotenv();

    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env().map_err(folio_core::FolioError::from)?;
    let db_config = DbConfig::from_env().map_err(folio_core::FolioError::from)?;
    let cache_config = CacheConfig::from_env().map_err(folio_core::FolioError::from)?;
    let redis_config = RedisConfig::from_env();
    let object_config = ObjectStoreConfig::from_env().map_err(folio_core::FolioError::from)?;

    let db = DbClient::from_config(&db_config)?;
    db.ensure_schema().await?;

    let redis: Arc<dyn CacheBackend> = Arc::new(RedisCacheBackend::connect(&redis_config).await?);
    let images = ImageBucket::from_config(&object_config)?;

    let article_store: Arc<dyn Store<Article>> = Arc::new(PgArticleStore::new(db.clone()));
    let articles = CachedStore::new(
        article_store,
        ReadThroughCache::new(redis.clone(), cache_config),
    );

    let probes: Vec<Arc<dyn ReadinessProbe>> = vec![
        Arc::new(DatabaseProbe(db.clone())),
        Arc::new(CacheProbe(redis)),
    ];

    let state = AppState {
        users: Arc::new(PgUserStore::new(db)),
        articles: Arc::new(articles),
        images,
        auth: Arc::new(auth_config),
        health: HealthState::new(probes),
    };

    let app = create_api_router(state, &api_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Folio API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
