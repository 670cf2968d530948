mod config;
mod db;
mod errors;
mod export;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::export::browser::ChromePdfEngine;
use crate::export::gateway::ExportGateway;
use crate::export::html::HtmlBinder;
use crate::export::pdf::PdfRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgResumeStore;

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

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgResumeStore::new(db));

    // Templates are compiled once; a broken template stops startup here.
    let binder = Arc::new(HtmlBinder::new()?);

    // Browsers launch lazily on the first PDF request.
    let engine = Arc::new(ChromePdfEngine::new(config.export.chrome_settings()));
    info!(
        "PDF engine configured (pool size: {}, timeout: {}s)",
        config.export.browser_pool_size,
        config.export.render_timeout.as_secs()
    );

    let gateway = ExportGateway::new(store, PdfRenderer::new(binder, engine));

    // Build app state
    let state = AppState {
        gateway,
        export_config: config.export.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
