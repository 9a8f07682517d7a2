// AskCampus Backend Entry Point
// FAQ matching engine plus its HTTP, storage and harvesting collaborators.

mod config;
mod database;
mod engine;
mod error;
mod harvest;
mod models;
mod render;
mod server;
mod translate;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{MatcherConfig, ServerConfig};
use engine::FaqMatcher;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let pool = database::init_db(&config.database_path).await?;
    database::seed_default_faqs(&pool).await?;

    let embedder = if config.semantic.enabled {
        engine::semantic::init_embedder(config.semantic.model_cache_dir.clone())
    } else {
        info!("Semantic matching disabled by configuration");
        None
    };

    let matcher = Arc::new(FaqMatcher::new(MatcherConfig::default(), embedder));
    matcher.reload(&pool).await?;
    info!(
        "Matcher ready: {} entries, semantic={}",
        matcher.entry_count(),
        matcher.semantic_available()
    );

    let state = Arc::new(AppState::new(pool, matcher, config, None));
    server::start(state).await
}
