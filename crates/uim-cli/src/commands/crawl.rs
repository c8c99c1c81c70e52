//! `uim crawl` - locate, fetch and ingest manifests.

use anyhow::{Context, bail};
use std::sync::Arc;
use uim_catalog::{Ingestor, SqliteCatalog};
use uim_core::UimConfig;
use uim_crawler::{Crawler, HickoryTxtResolver, HttpFetcher, Locator};

pub async fn run(config: &UimConfig, domains: Vec<String>) -> anyhow::Result<()> {
    let domains = if domains.is_empty() {
        config.crawler.domains.clone()
    } else {
        domains
    };
    if domains.is_empty() {
        bail!("no domains given and crawler.domains is empty");
    }

    let store = SqliteCatalog::connect(&config.catalog)
        .await
        .with_context(|| format!("opening catalog at {}", config.catalog.database_url))?;
    let resolver = HickoryTxtResolver::from_system_conf().context("loading DNS resolver config")?;
    let fetcher = HttpFetcher::new(config.crawler.timeout())?;

    let crawler = Crawler::new(
        Arc::new(Locator::new(Arc::new(resolver), &config.crawler)),
        Arc::new(fetcher),
        Arc::new(Ingestor::new(Arc::new(store))),
        config.crawler.concurrency,
    );

    let report = crawler.crawl(&domains).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "\n{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(())
}
