//! Crawl fan-out with fake DNS and manifest sources.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uim_catalog::{CatalogStore, Ingestor, SqliteCatalog};
use uim_core::{CrawlerConfig, Manifest};
use uim_crawler::{
    CrawlError, CrawlStage, Crawler, DomainStatus, Locator, ManifestSource, TxtResolver,
};
use url::Url;

struct FakeDns {
    records: HashMap<String, Vec<String>>,
}

#[async_trait]
impl TxtResolver for FakeDns {
    async fn txt_records(&self, domain: &str) -> Result<Vec<String>, CrawlError> {
        if domain == "slow.example" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.records
            .get(domain)
            .cloned()
            .ok_or_else(|| CrawlError::Resolve {
                domain: domain.to_string(),
                reason: "NXDOMAIN".to_string(),
            })
    }
}

struct FakeWeb {
    documents: HashMap<String, serde_json::Value>,
}

#[async_trait]
impl ManifestSource for FakeWeb {
    async fn fetch(&self, url: &Url) -> Result<Manifest, CrawlError> {
        let doc = self.documents.get(url.as_str()).ok_or(CrawlError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        serde_json::from_value(doc.clone()).map_err(|e| CrawlError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn manifest(service: &str) -> serde_json::Value {
    json!({
        "service-info": {"name": service, "service_url": format!("https://{service}")},
        "intents": [{
            "intent_uid": format!("{service}:Search:v1"),
            "intent_name": "Search",
            "description": "Search things",
            "tags": ["search"]
        }]
    })
}

async fn crawler(store: Arc<SqliteCatalog>) -> Crawler {
    let dns = FakeDns {
        records: HashMap::from([
            (
                "hinted.example".to_string(),
                vec!["uim-agents-file=https://cdn.example/hinted.json".to_string()],
            ),
            ("plain.example".to_string(), vec!["v=spf1 -all".to_string()]),
            ("broken.example".to_string(), vec![]),
            ("garbage.example".to_string(), vec![]),
        ]),
    };
    let web = FakeWeb {
        documents: HashMap::from([
            ("https://cdn.example/hinted.json".to_string(), manifest("hinted.example")),
            ("https://plain.example/agents.json".to_string(), manifest("plain.example")),
            ("https://nodns.example/agents.json".to_string(), manifest("nodns.example")),
            ("https://slow.example/agents.json".to_string(), manifest("slow.example")),
            ("https://garbage.example/agents.json".to_string(), json!({"hello": "world"})),
        ]),
    };

    let config = CrawlerConfig {
        timeout_ms: 200,
        ..Default::default()
    };
    let locator = Arc::new(Locator::new(Arc::new(dns), &config));
    let ingestor = Arc::new(Ingestor::new(store));
    Crawler::new(locator, Arc::new(web), ingestor, 4)
}

#[tokio::test]
async fn test_failing_domains_do_not_affect_others() {
    let store = Arc::new(SqliteCatalog::in_memory().await.unwrap());
    let crawler = crawler(store.clone()).await;

    let domains: Vec<String> = [
        "hinted.example",
        "broken.example",
        "plain.example",
        "garbage.example",
        "nodns.example",
        "slow.example",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect();

    let report = crawler.crawl(&domains).await;

    assert_eq!(report.outcomes.len(), 6);
    assert_eq!(report.succeeded(), 4);
    assert_eq!(report.failed(), 2);

    let by_domain: HashMap<&str, &DomainStatus> = report
        .outcomes
        .iter()
        .map(|o| (o.domain.as_str(), &o.status))
        .collect();
    assert!(matches!(
        by_domain["broken.example"],
        DomainStatus::Failed { stage: CrawlStage::Fetch, .. }
    ));
    assert!(matches!(
        by_domain["garbage.example"],
        DomainStatus::Failed { stage: CrawlStage::Fetch, .. }
    ));

    // Order of outcomes follows the input.
    assert_eq!(report.outcomes[0].domain, "hinted.example");
    assert_eq!(
        report.outcomes[0].manifest_url.as_deref(),
        Some("https://cdn.example/hinted.json")
    );

    for service in ["hinted.example", "plain.example", "nodns.example", "slow.example"] {
        assert!(
            store.find_service_by_name(service).await.unwrap().is_some(),
            "{service} missing"
        );
    }
    assert!(store.find_service_by_name("broken.example").await.unwrap().is_none());
}

#[tokio::test]
async fn test_recrawl_is_idempotent() {
    let store = Arc::new(SqliteCatalog::in_memory().await.unwrap());
    let crawler = crawler(store.clone()).await;
    let domains = vec!["plain.example".to_string(), "plain.example".to_string()];

    let report = crawler.crawl(&domains).await;
    assert_eq!(report.succeeded(), 2);
    crawler.crawl(&domains).await;

    assert_eq!(store.list_services().await.unwrap().len(), 1);
    let service = store.find_service_by_name("plain.example").await.unwrap().unwrap();
    assert_eq!(store.intents_for_service(service.id).await.unwrap().len(), 1);
}
