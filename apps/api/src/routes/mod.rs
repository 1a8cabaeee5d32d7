pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::runs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/runs", post(handlers::handle_create_run))
        .route("/api/v1/runs/upload", post(handlers::handle_upload_run))
        .route("/api/v1/runs/:id", get(handlers::handle_get_run))
        .route("/api/v1/runs/:id/report", get(handlers::handle_run_report))
        .with_state(state)
}
