//! # uim-core
//!
//! Shared types for the UIM discovery pipeline and trust handshake.
//!
//! - [`model`]: catalog entities (services, intents, tags) and the typed
//!   parameter schema used to validate intent calls.
//! - [`manifest`]: the `agents.json` document a service publishes.
//! - [`config`]: the `uim.yaml` configuration shared by every binary.

pub mod config;
pub mod error;
pub mod manifest;
pub mod model;

pub use config::{
    AgentConfig, CatalogConfig, CrawlerConfig, DiscoveryConfig, ProviderConfig, UimConfig,
};
pub use error::ModelError;
pub use manifest::{Compliance, IntentDescriptor, Manifest, ServiceInfo};
pub use model::{Intent, IntentUid, ParamSpec, ParamType, Service, Tag};
