//! Agent-side configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for an agent talking to providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identity the agent presents when requesting a token.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Directory holding one key pair per provider.
    #[serde(default = "default_key_dir")]
    pub key_dir: PathBuf,

    /// Timeout applied to every request sent to a provider.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            key_dir: default_key_dir(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_agent_id() -> String {
    "ai-agent-1".to_string()
}

fn default_key_dir() -> PathBuf {
    PathBuf::from("keys")
}

fn default_timeout_ms() -> u64 {
    10_000
}
