//! Per-provider agent key pairs on disk.

use crate::error::AgentError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uim_policy::AgentKeyPair;

const PRIVATE_KEY_FILE: &str = "private_key.pem";
const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// One Ed25519 key pair per provider, stored as PEM files under
/// `<root>/<sanitised service url>/`.
#[derive(Debug, Clone)]
pub struct KeyStore {
    root: PathBuf,
}

impl KeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the key pair for `service_url`.
    pub fn dir_for(&self, service_url: &str) -> PathBuf {
        self.root.join(sanitise(service_url))
    }

    /// Load the key pair for `service_url`, generating and persisting a new
    /// one on first use.
    pub fn load_or_generate(&self, service_url: &str) -> Result<AgentKeyPair, AgentError> {
        let dir = self.dir_for(service_url);
        let private_path = dir.join(PRIVATE_KEY_FILE);

        if private_path.exists() && dir.join(PUBLIC_KEY_FILE).exists() {
            let pem = fs::read_to_string(&private_path).map_err(|e| key_error(&private_path, e))?;
            let key = AgentKeyPair::from_pkcs8_pem(&pem)?;
            info!(service_url, path = %dir.display(), "agent key pair loaded");
            return Ok(key);
        }

        let key = AgentKeyPair::generate();
        self.save(&dir, &key)?;
        info!(service_url, path = %dir.display(), "agent key pair generated");
        Ok(key)
    }

    fn save(&self, dir: &Path, key: &AgentKeyPair) -> Result<(), AgentError> {
        fs::create_dir_all(dir).map_err(|e| key_error(dir, e))?;

        let private_path = dir.join(PRIVATE_KEY_FILE);
        fs::write(&private_path, key.private_key_pem()?).map_err(|e| key_error(&private_path, e))?;

        let public_path = dir.join(PUBLIC_KEY_FILE);
        fs::write(&public_path, key.public_key_pem()?).map_err(|e| key_error(&public_path, e))?;
        Ok(())
    }
}

fn sanitise(service_url: &str) -> String {
    service_url
        .trim_end_matches('/')
        .replace("://", "_")
        .replace([':', '/'], "_")
}

fn key_error(path: &Path, err: std::io::Error) -> AgentError {
    AgentError::KeyStore {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
