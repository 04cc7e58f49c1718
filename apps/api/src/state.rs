use std::sync::Arc;

use sqlx::SqlitePool;

use crate::analysis::pipeline::ResumeAnalyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Extraction and analysis clients over one shared LLM backend.
    pub analyzer: Arc<ResumeAnalyzer>,
    pub config: Config,
}
