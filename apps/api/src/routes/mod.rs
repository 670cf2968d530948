pub mod health;

use axum::{routing::get, Router};

use crate::export::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Export API
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        .route(
            "/api/v1/resumes/:id/download/:format",
            get(handlers::handle_download),
        )
        .route(
            "/api/v1/resumes/:id/preview",
            get(handlers::handle_preview),
        )
        .with_state(state)
}
