use crate::config::ExportConfig;
use crate::export::gateway::ExportGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the resume store and both renderers.
    pub gateway: ExportGateway,
    /// Reported by the health endpoint.
    pub export_config: ExportConfig,
}
