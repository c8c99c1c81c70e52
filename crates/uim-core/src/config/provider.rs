//! Provider-side configuration: identity, token lifetime and signing key.

use super::{default_true, parse_duration};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a service that publishes intents and issues tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Bind address, e.g. "0.0.0.0:4000".
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Externally visible base URL used in the manifest and policy.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Service name published in `service-info`.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default)]
    pub service_description: String,

    /// Token lifetime (e.g., "365d", "24h").
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,

    /// When true, tokens reference the accepted policy; otherwise they carry
    /// the explicit list of permitted intent uids.
    #[serde(default = "default_true")]
    pub policy_scoped_tokens: bool,

    /// Environment variable containing the token signing key (hex-encoded).
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to the token signing key file.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// License string published in the manifest.
    #[serde(default)]
    pub license: Option<String>,
}

impl ProviderConfig {
    /// Parsed token lifetime. Zero is rejected so `valid_to > valid_from`.
    pub fn token_ttl(&self) -> Result<Duration, ModelError> {
        let ttl = parse_duration("provider.token_ttl", &self.token_ttl)?;
        if ttl.is_zero() {
            return Err(ModelError::InvalidConfig {
                field: "provider.token_ttl".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(ttl)
    }

    /// Resolve the signing key from environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(env_var) = &self.private_key_env {
            if let Ok(key) = std::env::var(env_var) {
                return Ok(Some(key.trim().to_string()));
            }
        }

        if let Some(path) = &self.private_key_file {
            if path.exists() {
                let key = std::fs::read_to_string(path)?;
                return Ok(Some(key.trim().to_string()));
            }
        }

        Ok(None)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            base_url: default_base_url(),
            service_name: default_service_name(),
            service_description: String::new(),
            token_ttl: default_token_ttl(),
            policy_scoped_tokens: true,
            private_key_env: None,
            private_key_file: None,
            license: None,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:4000".to_string()
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_service_name() -> String {
    "localhost".to_string()
}

fn default_token_ttl() -> String {
    "365d".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_rejected() {
        let cfg = ProviderConfig {
            token_ttl: "0s".to_string(),
            ..Default::default()
        };
        assert!(cfg.token_ttl().is_err());
    }

    #[test]
    fn test_private_key_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "abcd\n").unwrap();
        let cfg = ProviderConfig {
            private_key_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_private_key().unwrap(), Some("abcd".to_string()));
    }
}
