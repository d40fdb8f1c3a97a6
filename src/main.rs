use std::sync::Arc;

use axum::Router;
use tracing_subscriber::EnvFilter;

use personaforge::config::env::AppConfig;
use personaforge::logger::Logger;
use personaforge::services::extraction::{OpenAiExtractor, PersonaExtractor};
use personaforge::services::storage::{BlobStore, RedisBlobStore};
use personaforge::{config, modules, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let logger = Logger::new(config.log_level);

    let redis = config::redis::connect(&config.redis_uri).await?;
    let storage: Arc<dyn BlobStore> = Arc::new(RedisBlobStore::new(redis, "personas"));
    let extractor: Arc<dyn PersonaExtractor> = Arc::new(OpenAiExtractor::new(&config));

    let state = AppState {
        storage,
        extractor,
        logger,
    };

    let app = Router::new()
        .merge(modules::persona::routes::routes())
        .merge(modules::chat::routes::routes())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
