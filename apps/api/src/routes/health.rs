use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the PDF engine settings in effect.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "vitae-api",
        "pdf": {
            "browser_pool_size": state.export_config.browser_pool_size,
            "render_timeout_secs": state.export_config.render_timeout.as_secs()
        }
    }))
}
