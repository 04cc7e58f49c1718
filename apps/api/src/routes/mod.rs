pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/upload", post(handlers::handle_upload))
        .route("/api/resumes", get(handlers::handle_list))
        .route(
            "/api/resumes/:id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
