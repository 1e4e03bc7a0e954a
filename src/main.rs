use std::sync::Arc;

use reelrank_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache},
    services::{providers::ShapedClient, Catalog},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelrank_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let policy = config.scoring_policy()?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client);

    let shaped = Arc::new(ShapedClient::new(&config, Some(cache.clone()))?);
    if config.ranking_api_key.is_empty() {
        tracing::warn!("RANKING_API_KEY is not set; feeds will fall back to catalog order");
    }

    let state = AppState::new(
        shaped.clone(),
        shaped,
        Arc::new(cache),
        policy,
        config.recommendation_limit,
    );

    if let Some(path) = &config.catalog_path {
        let catalog = Catalog::from_json_file(path)?;
        tracing::info!(path = %path, item_count = catalog.len(), "Loaded catalog");
        state.replace_catalog(catalog).await;
    }

    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
