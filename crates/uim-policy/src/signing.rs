//! Agent key pairs, policy signing and signed-policy verification.

use crate::document::Policy;
use crate::encoding;
use crate::error::PolicyError;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An agent's Ed25519 key pair.
#[derive(Clone)]
pub struct AgentKeyPair {
    signing_key: SigningKey,
}

impl AgentKeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            signing_key: SigningKey::from_bytes(&bytes),
        }
    }

    /// Load from a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, PolicyError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| PolicyError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Export the private key as PKCS#8 PEM.
    pub fn private_key_pem(&self) -> Result<String, PolicyError> {
        let pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| PolicyError::InvalidPrivateKey(e.to_string()))?;
        Ok(pem.to_string())
    }

    /// Export the public key as SPKI PEM.
    pub fn public_key_pem(&self) -> Result<String, PolicyError> {
        self.signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))
    }

    /// The public key in its JSON transport form: base64url of the SPKI PEM.
    pub fn public_key_b64url(&self) -> Result<String, PolicyError> {
        Ok(encoding::encode(self.public_key_pem()?.as_bytes()))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl std::fmt::Debug for AgentKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentKeyPair")
            .field("public_key", &self.verifying_key())
            .finish_non_exhaustive()
    }
}

/// Encode raw Ed25519 public key bytes in the transport form used in
/// manifests and requests (base64url SPKI PEM).
pub fn encode_public_key(raw: &[u8]) -> Result<String, PolicyError> {
    let key = VerifyingKey::try_from(raw).map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))?;
    let pem = key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))?;
    Ok(encoding::encode(pem.as_bytes()))
}

/// Decode a public key from its transport form (base64url SPKI PEM).
pub fn decode_public_key(b64url: &str) -> Result<VerifyingKey, PolicyError> {
    let bytes = encoding::decode(b64url).map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))?;
    let pem = String::from_utf8(bytes).map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))?;
    VerifyingKey::from_public_key_pem(&pem).map_err(|e| PolicyError::InvalidPublicKey(e.to_string()))
}

/// An agent's assertion that it accepted a specific policy instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPolicy {
    /// The exact bytes that were signed, as UTF-8 JSON.
    pub policy_payload: String,
    /// base64url Ed25519 signature over `policy_payload`.
    pub signature: String,
    /// base64url SPKI PEM of the signing key.
    pub signer_public_key: String,
}

/// Signs policies on behalf of an agent.
pub struct PolicySigner<'a> {
    key: &'a AgentKeyPair,
}

impl<'a> PolicySigner<'a> {
    pub fn new(key: &'a AgentKeyPair) -> Self {
        Self { key }
    }

    /// Sign the canonical bytes of `policy`.
    pub fn sign(&self, policy: &Policy) -> Result<SignedPolicy, PolicyError> {
        policy.validate()?;
        let payload = policy.canonical_bytes()?;
        let signature = self.key.signing_key.sign(&payload);
        let policy_payload =
            String::from_utf8(payload).map_err(|e| PolicyError::Malformed(e.to_string()))?;

        Ok(SignedPolicy {
            policy_payload,
            signature: encoding::encode(&signature.to_bytes()),
            signer_public_key: self.key.public_key_b64url()?,
        })
    }
}

/// A signed policy that passed verification.
#[derive(Debug, Clone)]
pub struct VerifiedPolicy {
    pub policy: Policy,
    pub agent_key: VerifyingKey,
}

/// Verify that `signed` is the agent's signature over `served`.
///
/// Checks, in order: the embedded signer key is the submitted agent key, the
/// signature verifies over the payload bytes, and the payload is exactly the
/// policy this provider serves.
pub fn verify_signed_policy(
    signed: &SignedPolicy,
    served: &Policy,
    agent_public_key: &str,
) -> Result<VerifiedPolicy, PolicyError> {
    let agent_key = decode_public_key(agent_public_key)?;
    let signer_key = decode_public_key(&signed.signer_public_key)?;
    if agent_key != signer_key {
        return Err(PolicyError::KeyMismatch);
    }

    let sig_bytes = encoding::decode(&signed.signature)
        .map_err(|e| PolicyError::InvalidSignatureEncoding(e.to_string()))?;
    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|e| PolicyError::InvalidSignatureEncoding(e.to_string()))?;

    agent_key
        .verify_strict(signed.policy_payload.as_bytes(), &signature)
        .map_err(|_| PolicyError::SignatureMismatch)?;

    if signed.policy_payload.as_bytes() != served.canonical_bytes()?.as_slice() {
        return Err(PolicyError::PayloadMismatch);
    }

    debug!(policy_id = %served.id, "signed policy verified");
    Ok(VerifiedPolicy {
        policy: served.clone(),
        agent_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_policy;

    #[test]
    fn test_sign_and_verify() {
        let key = AgentKeyPair::generate();
        let policy = sample_policy();
        let signed = PolicySigner::new(&key).sign(&policy).unwrap();

        let verified =
            verify_signed_policy(&signed, &policy, &key.public_key_b64url().unwrap()).unwrap();
        assert_eq!(verified.policy.id, policy.id);
        assert_eq!(verified.agent_key, key.verifying_key());
    }

    #[test]
    fn test_encode_public_key_matches_agent_form() {
        let key = AgentKeyPair::generate();
        let raw = key.verifying_key().to_bytes();
        assert_eq!(encode_public_key(&raw).unwrap(), key.public_key_b64url().unwrap());
        assert!(encode_public_key(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = AgentKeyPair::generate();
        let policy = sample_policy();
        let a = PolicySigner::new(&key).sign(&policy).unwrap();
        let b = PolicySigner::new(&key).sign(&policy).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = AgentKeyPair::generate();
        let policy = sample_policy();
        let mut signed = PolicySigner::new(&key).sign(&policy).unwrap();
        signed.policy_payload = signed.policy_payload.replacen("1000", "9999", 1);

        let err = verify_signed_policy(&signed, &policy, &key.public_key_b64url().unwrap())
            .unwrap_err();
        assert!(matches!(err, PolicyError::SignatureMismatch));
    }

    #[test]
    fn test_signature_over_other_policy_rejected() {
        let key = AgentKeyPair::generate();
        let served = sample_policy();
        let mut other = sample_policy();
        other.id = "http://evil.example/policy".to_string();
        let signed = PolicySigner::new(&key).sign(&other).unwrap();

        let err = verify_signed_policy(&signed, &served, &key.public_key_b64url().unwrap())
            .unwrap_err();
        assert!(matches!(err, PolicyError::PayloadMismatch));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let key = AgentKeyPair::generate();
        let other = AgentKeyPair::generate();
        let policy = sample_policy();
        let signed = PolicySigner::new(&key).sign(&policy).unwrap();

        let err = verify_signed_policy(&signed, &policy, &other.public_key_b64url().unwrap())
            .unwrap_err();
        assert!(matches!(err, PolicyError::KeyMismatch));

        let mut forged = signed.clone();
        forged.signer_public_key = other.public_key_b64url().unwrap();
        let err = verify_signed_policy(&forged, &policy, &other.public_key_b64url().unwrap())
            .unwrap_err();
        assert!(matches!(err, PolicyError::SignatureMismatch));
    }

    #[test]
    fn test_pem_roundtrip_keeps_identity() {
        let key = AgentKeyPair::generate();
        let restored = AgentKeyPair::from_pkcs8_pem(&key.private_key_pem().unwrap()).unwrap();
        assert_eq!(restored.verifying_key(), key.verifying_key());
        assert!(decode_public_key("not-a-key").is_err());
    }
}
