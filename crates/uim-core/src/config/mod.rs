//! Configuration types for the UIM services.
//!
//! A single YAML file (`uim.yaml`) holds one section per component. Every
//! field has a serde default, so a partial file (or no file at all) yields a
//! usable configuration.
//!
//! ```yaml
//! catalog:
//!   database_url: sqlite://data/uim-catalog.sqlite
//! crawler:
//!   timeout_ms: 5000
//!   domains: [fakerealestate.com]
//! provider:
//!   base_url: http://localhost:4000
//!   token_ttl: 365d
//!   private_key_env: UIM_PROVIDER_PRIVATE_KEY
//! ```

pub mod agent;
pub mod catalog;
pub mod crawler;
pub mod discovery;
pub mod provider;

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use agent::AgentConfig;
pub use catalog::CatalogConfig;
pub use crawler::CrawlerConfig;
pub use discovery::DiscoveryConfig;
pub use provider::ProviderConfig;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "UIM_CONFIG";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "uim.yaml";

/// Complete configuration loaded from `uim.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UimConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

impl UimConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ModelError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Load from an explicit path, else `$UIM_CONFIG`, else `./uim.yaml`.
    ///
    /// A missing file yields the defaults; a present but invalid file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ModelError> {
        let path = resolve_path(explicit);
        if !path.exists() {
            if explicit.is_some() {
                return Err(ModelError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", path.display()),
                )));
            }
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }
}

fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Parse a humane duration such as `"30s"`, `"24h"` or `"365d"`.
pub fn parse_duration(field: &str, value: &str) -> Result<std::time::Duration, ModelError> {
    humantime::parse_duration(value.trim()).map_err(|e| ModelError::InvalidConfig {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let cfg = UimConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg.catalog.max_page_size, 100);
        assert_eq!(cfg.catalog.max_search_candidates, 1000);
        assert_eq!(cfg.crawler.timeout_ms, 10_000);
        assert_eq!(cfg.provider.token_ttl, "365d");
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let cfg = UimConfig::from_yaml(
            r#"
crawler:
  timeout_ms: 250
  domains: [a.com, b.com]
provider:
  base_url: http://localhost:4000
"#,
        )
        .unwrap();
        assert_eq!(cfg.crawler.timeout_ms, 250);
        assert_eq!(cfg.crawler.domains, vec!["a.com", "b.com"]);
        assert_eq!(cfg.crawler.dns_cache_size, 1024);
        assert_eq!(cfg.provider.base_url, "http://localhost:4000");
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "catalog:\n  max_connections: 2").unwrap();
        let cfg = UimConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.catalog.max_connections, 2);
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        let err = UimConfig::load(Some(Path::new("/nonexistent/uim.yaml")));
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            parse_duration("ttl", "365d").unwrap(),
            std::time::Duration::from_secs(365 * 86_400)
        );
        assert!(parse_duration("ttl", "soon").is_err());
    }
}
