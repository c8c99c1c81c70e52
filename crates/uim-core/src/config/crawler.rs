//! Crawler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the locator, fetcher and crawl fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Timeout applied separately to each DNS lookup and each manifest fetch.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of domains whose DNS answer is cached.
    #[serde(default = "default_dns_cache_size")]
    pub dns_cache_size: usize,

    /// Maximum number of domain pipelines running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// TXT record prefixes that carry a manifest URL, tried in order.
    #[serde(default = "default_txt_keys")]
    pub txt_keys: Vec<String>,

    /// Domains crawled by `uim crawl` when none are given on the command line.
    #[serde(default)]
    pub domains: Vec<String>,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            dns_cache_size: default_dns_cache_size(),
            concurrency: default_concurrency(),
            txt_keys: default_txt_keys(),
            domains: Vec::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_dns_cache_size() -> usize {
    1024
}

fn default_concurrency() -> usize {
    16
}

fn default_txt_keys() -> Vec<String> {
    vec!["uim-agents-file=".to_string(), "agents_json_url=".to_string()]
}
