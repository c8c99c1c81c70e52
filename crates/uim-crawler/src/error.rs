//! Error types for discovery.

use thiserror::Error;

/// Errors raised while locating, fetching or ingesting a manifest.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// DNS resolution failed.
    #[error("DNS lookup failed for {domain}: {reason}")]
    Resolve { domain: String, reason: String },

    /// A network operation exceeded the caller's timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The body is not a manifest.
    #[error("undecodable manifest at {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The manifest URL is not usable.
    #[error("invalid manifest URL {0}")]
    InvalidUrl(String),

    /// The catalog rejected the manifest.
    #[error("ingestion failed: {0}")]
    Ingest(#[from] uim_catalog::CatalogError),
}
