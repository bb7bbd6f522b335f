use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{
    assets::fetch::ImageFetcher,
    pipeline::Renderer,
    service::{config::Config, store::DocumentStore},
};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Renderer,
    pub store: Arc<dyn DocumentStore>,
    /// Bounds renders in flight; each holds a full-page raster in memory.
    pub render_permits: Arc<Semaphore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn ImageFetcher>,
        fontdb: Arc<usvg::fontdb::Database>,
    ) -> Self {
        let renderer = Renderer::new(
            fetcher,
            config.fetch_options(),
            fontdb,
            config.render_options(),
        );
        let render_permits = Arc::new(Semaphore::new(config.render.max_concurrent.max(1)));
        Self {
            renderer,
            store,
            render_permits,
            config: Arc::new(config),
        }
    }
}
