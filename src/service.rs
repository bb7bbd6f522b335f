//! HTTP boundary: `POST /designs/pdf` renders a stored or inline design to a print PDF.

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::assets::{fetch::ReqwestFetcher, system_fontdb};

pub mod config;
pub mod error;
pub mod handler;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::ServiceError;
pub use state::AppState;
pub use store::{DocumentKind, DocumentRecord, DocumentStore, FilesystemDocumentStore, InMemoryDocumentStore};

pub fn router(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes();
    Router::new()
        .route("/health", get(handler::health))
        .route("/designs/pdf", post(handler::generate_pdf))
        .route("/v1/designs/pdf", post(handler::generate_pdf))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the service until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let fetcher = ReqwestFetcher::new(&config.fetch_options())?;
    let store = FilesystemDocumentStore::new(config.store.root.clone());
    tracing::info!(root = %config.store.root.display(), "document store ready");

    let fontdb = tokio::task::spawn_blocking(system_fontdb)
        .await
        .context("load system fonts")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(store), Arc::new(fetcher), fontdb);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("printready listening on {addr}");
    tracing::info!("  - POST /designs/pdf");
    tracing::info!("  - GET  /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("ctrl-c handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
