//! `uim serve` - discovery and search API.

use anyhow::Context;
use std::sync::Arc;
use uim_catalog::SqliteCatalog;
use uim_core::UimConfig;
use uim_server::DiscoveryServer;

pub async fn run(mut config: UimConfig, listen: Option<String>) -> anyhow::Result<()> {
    if let Some(addr) = listen {
        config.discovery.listen_addr = addr;
    }

    let store = SqliteCatalog::connect(&config.catalog)
        .await
        .with_context(|| format!("opening catalog at {}", config.catalog.database_url))?;

    DiscoveryServer::new(config.discovery.clone(), &config.catalog, Arc::new(store))
        .run()
        .await
        .with_context(|| format!("serving on {}", config.discovery.listen_addr))
}
