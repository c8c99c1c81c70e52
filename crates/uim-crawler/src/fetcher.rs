//! Manifest retrieval.

use crate::error::CrawlError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use uim_core::Manifest;
use url::Url;

/// Anything that can produce a manifest for a URL.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Manifest, CrawlError>;
}

/// Single-GET manifest fetcher. No retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uim-crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Fetch, reporting any failure as "no manifest".
    pub async fn fetch_manifest(&self, url: &Url) -> Option<Manifest> {
        match self.fetch(url).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(url = %url, error = %e, "manifest fetch failed");
                None
            }
        }
    }
}

#[async_trait]
impl ManifestSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Manifest, CrawlError> {
        let request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| CrawlError::Timeout {
                operation: format!("GET {url}"),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        decode_manifest(url, &body)
    }
}

/// Decode a manifest body; anything that is not a manifest is a fetch failure.
pub fn decode_manifest(url: &Url, body: &[u8]) -> Result<Manifest, CrawlError> {
    serde_json::from_slice(body).map_err(|e| CrawlError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_non_manifest() {
        let url = Url::parse("https://a.example/agents.json").unwrap();
        assert!(matches!(
            decode_manifest(&url, b"<html>not json</html>"),
            Err(CrawlError::Decode { .. })
        ));
        assert!(matches!(
            decode_manifest(&url, br#"{"intents": []}"#),
            Err(CrawlError::Decode { .. })
        ));

        let ok = decode_manifest(
            &url,
            br#"{"service-info": {"name": "a.example", "service_url": "https://a.example"}, "intents": []}"#,
        )
        .unwrap();
        assert_eq!(ok.service_info.name, "a.example");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_no_manifest() {
        let fetcher = HttpFetcher::new(Duration::from_millis(500)).unwrap();
        let url = Url::parse("http://127.0.0.1:9/agents.json").unwrap();
        assert!(fetcher.fetch_manifest(&url).await.is_none());
    }
}
