//! Error types for policy handling.

use thiserror::Error;

/// Errors raised while parsing, signing or verifying a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy document is missing a required section or does not parse.
    #[error("malformed policy document: {0}")]
    Malformed(String),

    /// A public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A private key could not be decoded or encoded.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The signature field is not a well-formed Ed25519 signature.
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    /// The signature does not verify under the claimed key.
    #[error("policy signature does not verify")]
    SignatureMismatch,

    /// The signed payload is not the policy this provider serves.
    #[error("signed payload does not match the served policy")]
    PayloadMismatch,

    /// The key embedded in the signed policy differs from the submitted key.
    #[error("signer key does not match the submitted agent key")]
    KeyMismatch,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
