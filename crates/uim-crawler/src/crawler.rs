//! Concurrent crawl over many domains.

use crate::error::CrawlError;
use crate::fetcher::ManifestSource;
use crate::locator::{LocatedManifest, Locator};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uim_catalog::Ingestor;

/// Pipeline step at which a domain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStage {
    Locate,
    Fetch,
    Ingest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DomainStatus {
    Ingested { service: String, intents: usize },
    Failed { stage: CrawlStage, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainOutcome {
    pub domain: String,
    pub manifest_url: Option<String>,
    #[serde(flatten)]
    pub status: DomainStatus,
}

/// Per-domain results, in the order the domains were given.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub outcomes: Vec<DomainOutcome>,
}

impl CrawlReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DomainStatus::Ingested { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Runs Locator → Fetcher → Ingestor for each domain.
pub struct Crawler {
    locator: Arc<Locator>,
    source: Arc<dyn ManifestSource>,
    ingestor: Arc<Ingestor>,
    concurrency: usize,
}

impl Crawler {
    pub fn new(
        locator: Arc<Locator>,
        source: Arc<dyn ManifestSource>,
        ingestor: Arc<Ingestor>,
        concurrency: usize,
    ) -> Self {
        Self {
            locator,
            source,
            ingestor,
            concurrency: concurrency.max(1),
        }
    }

    /// Crawl all domains. Individual failures are recorded, never propagated.
    pub async fn crawl(&self, domains: &[String]) -> CrawlReport {
        info!(domains = domains.len(), concurrency = self.concurrency, "starting crawl");

        let mut results: Vec<(usize, DomainOutcome)> = stream::iter(domains.iter().enumerate())
            .map(|(index, domain)| async move { (index, self.crawl_domain(domain).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let report = CrawlReport {
            outcomes: results.into_iter().map(|(_, outcome)| outcome).collect(),
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "crawl finished"
        );
        report
    }

    /// Run the pipeline for one domain.
    pub async fn crawl_domain(&self, domain: &str) -> DomainOutcome {
        let located = match self.locator.locate(domain).await {
            Ok(located) => located,
            Err(e) => return failed(domain, None, CrawlStage::Locate, e),
        };
        let LocatedManifest { url, hint } = located;
        let manifest_url = Some(url.to_string());

        let manifest = match self.source.fetch(&url).await {
            Ok(manifest) => manifest,
            Err(e) => return failed(domain, manifest_url, CrawlStage::Fetch, e),
        };

        match self.ingestor.ingest(&manifest).await {
            Ok(report) => {
                info!(
                    domain,
                    url = %url,
                    ?hint,
                    service = %report.service.name,
                    intents = report.intent_uids.len(),
                    "domain crawled"
                );
                DomainOutcome {
                    domain: domain.to_string(),
                    manifest_url,
                    status: DomainStatus::Ingested {
                        service: report.service.name,
                        intents: report.intent_uids.len(),
                    },
                }
            }
            Err(e) => failed(domain, manifest_url, CrawlStage::Ingest, e.into()),
        }
    }
}

fn failed(
    domain: &str,
    manifest_url: Option<String>,
    stage: CrawlStage,
    error: CrawlError,
) -> DomainOutcome {
    warn!(domain, ?stage, error = %error, "domain crawl failed");
    DomainOutcome {
        domain: domain.to_string(),
        manifest_url,
        status: DomainStatus::Failed {
            stage,
            error: error.to_string(),
        },
    }
}
