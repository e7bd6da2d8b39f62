mod analysis;
mod config;
mod db;
mod errors;
mod models;
mod ranking;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::build_provider;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::ranking::engine::RankingEngine;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::PgCandidateStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Ranker v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    ensure_schema(&pool).await?;
    let store = Arc::new(PgCandidateStore::new(pool));

    // Initialize analysis provider (local heuristic unless ANALYSIS_PROVIDER=remote)
    let provider = build_provider(&config)?;
    info!(
        "Analysis provider initialized: {} (timeout {:?}, attempts {})",
        provider.name(),
        config.analysis_timeout,
        config.analysis_max_attempts
    );

    let engine = RankingEngine::new(config.analysis_concurrency);
    info!("Ranking concurrency: {}", engine.max_concurrency());

    let state = AppState {
        store,
        provider,
        engine,
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
