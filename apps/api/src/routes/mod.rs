pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume analysis API
        .route("/api/v1/resume/analyze", post(handlers::handle_analyze))
        .route("/api/v1/resume/improve", post(handlers::handle_improve))
        .route("/api/v1/resume/match", post(handlers::handle_match))
        .route("/api/v1/chart/:percentage", get(handlers::handle_chart))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
