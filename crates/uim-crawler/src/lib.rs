//! # uim-crawler
//!
//! Finds and ingests service manifests.
//!
//! For each domain the pipeline is Locator → Fetcher → Ingestor:
//!
//! 1. [`Locator`] looks for a manifest URL in the domain's DNS TXT records
//!    and falls back to `https://<domain>/agents.json`.
//! 2. A [`ManifestSource`] (normally [`HttpFetcher`]) GETs and decodes the
//!    manifest.
//! 3. The catalog [`Ingestor`](uim_catalog::Ingestor) applies it.
//!
//! [`Crawler`] runs the pipeline for many domains concurrently. A failure in
//! one domain is logged and recorded in the [`CrawlReport`]; it never stops
//! the others. Nothing is retried automatically.

pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod locator;

pub use crawler::{CrawlReport, CrawlStage, Crawler, DomainOutcome, DomainStatus};
pub use error::CrawlError;
pub use fetcher::{HttpFetcher, ManifestSource};
pub use locator::{HickoryTxtResolver, LocatedManifest, Locator, ManifestHint, TxtResolver};
