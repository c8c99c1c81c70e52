//! Manifest location through DNS TXT records.

use crate::error::CrawlError;
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uim_core::CrawlerConfig;
use url::Url;

/// Source of TXT records for a domain.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    async fn txt_records(&self, domain: &str) -> Result<Vec<String>, CrawlError>;
}

/// TXT lookups through the system resolver configuration.
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    pub fn from_system_conf() -> Result<Self, CrawlError> {
        let resolver =
            TokioAsyncResolver::tokio_from_system_conf().map_err(|e| CrawlError::Resolve {
                domain: "<system>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { resolver })
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn txt_records(&self, domain: &str) -> Result<Vec<String>, CrawlError> {
        let lookup = self
            .resolver
            .txt_lookup(domain)
            .await
            .map_err(|e| CrawlError::Resolve {
                domain: domain.to_string(),
                reason: e.to_string(),
            })?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect::<String>()
            })
            .collect())
    }
}

/// Where a manifest URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestHint {
    Dns,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedManifest {
    pub url: Url,
    pub hint: ManifestHint,
}

/// Resolves a domain to its manifest URL. DNS problems never surface as
/// errors: they yield the well-known fallback location. Only a domain that
/// cannot form a URL is rejected.
pub struct Locator {
    resolver: Arc<dyn TxtResolver>,
    txt_keys: Vec<String>,
    timeout: Duration,
    cache: Mutex<HintCache>,
}

impl Locator {
    pub fn new(resolver: Arc<dyn TxtResolver>, config: &CrawlerConfig) -> Self {
        Self {
            resolver,
            txt_keys: config.txt_keys.clone(),
            timeout: config.timeout(),
            cache: Mutex::new(HintCache::new(config.dns_cache_size)),
        }
    }

    pub async fn locate(&self, domain: &str) -> Result<LocatedManifest, CrawlError> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();

        let hint = match self.cached(&domain).await {
            Some(hint) => hint,
            None => {
                let hint = self.lookup_hint(&domain).await;
                if let Some(hint) = &hint {
                    self.cache.lock().await.insert(domain.clone(), hint.clone());
                }
                hint.flatten()
            }
        };

        if let Some(url) = hint {
            debug!(domain = %domain, url = %url, "manifest located via DNS");
            return Ok(LocatedManifest {
                url,
                hint: ManifestHint::Dns,
            });
        }

        let url = fallback_url(&domain)?;
        debug!(domain = %domain, url = %url, "manifest located via fallback");
        Ok(LocatedManifest {
            url,
            hint: ManifestHint::Fallback,
        })
    }

    async fn cached(&self, domain: &str) -> Option<Option<Url>> {
        self.cache.lock().await.get(domain)
    }

    /// `None` when the lookup itself failed (not cached, so a later crawl
    /// asks again); `Some(None)` when the domain has no usable record.
    async fn lookup_hint(&self, domain: &str) -> Option<Option<Url>> {
        let records = match tokio::time::timeout(self.timeout, self.resolver.txt_records(domain)).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                warn!(domain, error = %e, "TXT lookup failed, using fallback");
                return None;
            }
            Err(_) => {
                warn!(domain, timeout_ms = self.timeout.as_millis() as u64, "TXT lookup timed out, using fallback");
                return None;
            }
        };

        let hint = records
            .iter()
            .find_map(|record| parse_hint(record, &self.txt_keys))
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
                _ => {
                    warn!(domain, hint = %raw, "ignoring unusable manifest URL in TXT record");
                    None
                }
            });
        Some(hint)
    }
}

/// Extract the value following the first matching key in a TXT record.
pub fn parse_hint(record: &str, keys: &[String]) -> Option<String> {
    let record = record.trim().trim_matches('"');
    keys.iter().find_map(|key| {
        record.find(key.as_str()).and_then(|pos| {
            let value = record[pos + key.len()..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

pub fn fallback_url(domain: &str) -> Result<Url, CrawlError> {
    Url::parse(&format!("https://{}/agents.json", domain))
        .map_err(|e| CrawlError::InvalidUrl(format!("{domain}: {e}")))
}

/// Bounded FIFO cache of per-domain lookup results.
struct HintCache {
    capacity: usize,
    entries: HashMap<String, Option<Url>>,
    order: VecDeque<String>,
}

impl HintCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, domain: &str) -> Option<Option<Url>> {
        self.entries.get(domain).cloned()
    }

    fn insert(&mut self, domain: String, hint: Option<Url>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(domain.clone(), hint).is_none() {
            self.order.push_back(domain);
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        records: Result<Vec<String>, ()>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TxtResolver for CountingResolver {
        async fn txt_records(&self, domain: &str) -> Result<Vec<String>, CrawlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records.clone().map_err(|_| CrawlError::Resolve {
                domain: domain.to_string(),
                reason: "NXDOMAIN".to_string(),
            })
        }
    }

    fn keys() -> Vec<String> {
        CrawlerConfig::default().txt_keys
    }

    #[test]
    fn test_parse_hint_variants() {
        assert_eq!(
            parse_hint("\"uim-agents-file=https://a.example/m.json\"", &keys()),
            Some("https://a.example/m.json".to_string())
        );
        assert_eq!(
            parse_hint("agents_json_url=https://b.example/agents.json", &keys()),
            Some("https://b.example/agents.json".to_string())
        );
        assert_eq!(parse_hint("v=spf1 -all", &keys()), None);
        assert_eq!(parse_hint("uim-agents-file=", &keys()), None);
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut cache = HintCache::new(2);
        cache.insert("a".into(), None);
        cache.insert("b".into(), None);
        cache.insert("c".into(), None);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn test_dns_hint_used_and_cached() {
        let resolver = Arc::new(CountingResolver {
            records: Ok(vec!["uim-agents-file=https://cdn.example/agents.json".into()]),
            calls: AtomicUsize::new(0),
        });
        let locator = Locator::new(resolver.clone(), &CrawlerConfig::default());

        for _ in 0..3 {
            let located = locator.locate("Example.com").await.unwrap();
            assert_eq!(located.hint, ManifestHint::Dns);
            assert_eq!(located.url.as_str(), "https://cdn.example/agents.json");
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dns_failure_falls_back_without_caching() {
        let resolver = Arc::new(CountingResolver {
            records: Err(()),
            calls: AtomicUsize::new(0),
        });
        let locator = Locator::new(resolver.clone(), &CrawlerConfig::default());

        let located = locator.locate("example.com").await.unwrap();
        assert_eq!(located.hint, ManifestHint::Fallback);
        assert_eq!(located.url.as_str(), "https://example.com/agents.json");

        locator.locate("example.com").await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unusable_hint_falls_back() {
        let resolver = Arc::new(CountingResolver {
            records: Ok(vec!["uim-agents-file=ftp://example.com/agents.json".into()]),
            calls: AtomicUsize::new(0),
        });
        let locator = Locator::new(resolver, &CrawlerConfig::default());
        let located = locator.locate("example.com").await.unwrap();
        assert_eq!(located.hint, ManifestHint::Fallback);
    }
}
