pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::processing::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/jobs/:job_id/process",
            post(handlers::handle_submit),
        )
        .route(
            "/api/v1/jobs/:job_id/resumes",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/jobs/:job_id/processing-status",
            get(handlers::handle_processing_status),
        )
        .route("/api/v1/queue/status", get(handlers::handle_queue_status))
        .with_state(state)
}
