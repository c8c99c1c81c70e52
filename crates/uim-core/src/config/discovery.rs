//! Discovery API server configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Bind address, e.g. "0.0.0.0:8000".
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}
