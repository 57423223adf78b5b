use std::sync::Arc;

use reelmatch_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, MemoryStore, PgStore, UserDataStore},
    routes::create_router,
    services::{
        providers::tmdb::TmdbProvider, EngineSettings, RecommendationEngine, SimilarityIndex,
    },
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Catalog and similarity matrix are read once and shared read-only
    let index = {
        let movie_list_path = config.movie_list_path.clone();
        let similarity_path = config.similarity_path.clone();
        tokio::task::spawn_blocking(move || SimilarityIndex::load(movie_list_path, similarity_path))
            .await??
    };
    let index = Arc::new(index);

    let store: Arc<dyn UserDataStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, user data will be kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?).await;
            tracing::info!("TMDB responses will be cached in Redis");
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let enricher = TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_base_url.clone(),
        config.enrichment_timeout(),
    )?;

    let engine = RecommendationEngine::new(
        index.clone(),
        Arc::new(enricher),
        EngineSettings {
            enrichment_timeout: config.enrichment_timeout(),
            max_concurrency: config.enrichment_concurrency,
        },
    );

    let state = Arc::new(AppState::new(
        index,
        engine,
        store,
        config.default_recommendations,
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
