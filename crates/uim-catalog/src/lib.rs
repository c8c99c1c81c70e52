//! # uim-catalog
//!
//! The searchable intent catalog.
//!
//! - [`store`]: the [`CatalogStore`] trait and its SQLite implementation.
//!   Every manifest is applied in a single transaction using
//!   upsert-on-conflict keyed on `services.name` and `intents.intent_uid`.
//! - [`ingest`]: the [`Ingestor`], which validates manifests and serializes
//!   writes per service.
//! - [`search`]: structured filter search and natural-language search with a
//!   shared pagination contract.

pub mod error;
pub mod ingest;
pub mod search;
pub mod store;

pub use error::CatalogError;
pub use ingest::{IngestReport, Ingestor};
pub use search::{FilterQuery, Page, SearchEngine, SearchPage, fold, split_tags};
pub use store::{CatalogStore, SqliteCatalog};
