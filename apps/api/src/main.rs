mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
#[cfg(test)]
mod log_capture;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::ResumeAnalyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite (creates the file and applies migrations)
    let db = create_pool(&config.database_url).await?;
    info!("Database ready at {}", config.database_url);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let policy = config.retry_policy();
    info!(
        "LLM retry policy: {} attempts, initial delay {:?}, factor {}",
        policy.retries, policy.initial_delay, policy.backoff_factor
    );
    let analyzer = Arc::new(ResumeAnalyzer::new(
        Arc::new(llm),
        policy,
        config.max_resume_chars,
    ));

    let state = AppState {
        db,
        analyzer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
