//! Discovery server.

use crate::routes::{AppState, create_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use uim_catalog::{CatalogStore, SearchEngine};
use uim_core::{CatalogConfig, DiscoveryConfig};

pub struct DiscoveryServer {
    config: DiscoveryConfig,
    state: Arc<AppState>,
}

impl DiscoveryServer {
    pub fn new(
        config: DiscoveryConfig,
        catalog: &CatalogConfig,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        let search = SearchEngine::new(store.clone(), catalog);
        Self {
            config,
            state: Arc::new(AppState { store, search }),
        }
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        tracing::info!(address = %self.config.listen_addr, "UIM discovery API listening");

        axum::serve(listener, create_router(self.state.clone()))
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown signal received");
                }
            })
            .await
    }
}
