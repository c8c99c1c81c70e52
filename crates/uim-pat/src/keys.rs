//! Provider signing key for PATs.

use crate::error::PatError;
use biscuit_auth::{Algorithm, KeyPair as BiscuitKeyPair, PrivateKey, PublicKey};
use rand::RngCore;
use std::path::Path;
use std::sync::Arc;

/// The provider's Ed25519 keypair. Cloning shares the same key material.
#[derive(Clone)]
pub struct KeyPair {
    inner: Arc<BiscuitKeyPair>,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Result<Self, PatError> {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);

        let private_key = PrivateKey::from_bytes(&bytes, Algorithm::Ed25519)
            .map_err(|e| PatError::KeyGenerationFailed(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        Self {
            inner: Arc::new(BiscuitKeyPair::from(&private_key)),
        }
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, PatError> {
        let private_key = PrivateKey::from_bytes_hex(hex.trim(), Algorithm::Ed25519)
            .map_err(|e| PatError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    pub(crate) fn inner(&self) -> &BiscuitKeyPair {
        &self.inner
    }

    pub fn public_key(&self) -> PublicKey {
        self.inner.public()
    }

    pub fn private_key_hex(&self) -> String {
        self.inner.private().to_bytes_hex()
    }

    /// Raw public key bytes, for publishing in other encodings.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.inner.public().to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        self.inner.public().to_bytes_hex()
    }

    /// Write the private key as hex.
    pub fn save_to_file(&self, path: &Path) -> Result<(), PatError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.private_key_hex())?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PatError> {
        let hex = std::fs::read_to_string(path)?;
        Self::from_private_key_hex(&hex)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
