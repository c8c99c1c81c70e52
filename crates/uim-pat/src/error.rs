//! Error types for token handling.

use thiserror::Error;

/// Errors that can occur while minting or verifying a PAT.
#[derive(Debug, Error)]
pub enum PatError {
    /// Failed to generate keypair.
    #[error("failed to generate keypair: {0}")]
    KeyGenerationFailed(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to create token.
    #[error("failed to create token: {0}")]
    TokenCreationFailed(String),

    /// Requested validity window is empty or inverted.
    #[error("invalid validity window: valid_to must be after valid_from")]
    InvalidValidity,

    /// The credential is not a decodable token at all.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token decodes but its integrity proof does not verify.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("token expired at {valid_to}")]
    Expired { valid_to: String },

    /// Token is not valid yet.
    #[error("token not valid before {valid_from}")]
    NotYetValid { valid_from: String },

    /// The requested intent is not covered by the granted scope.
    #[error("intent {intent_uid} is outside the token scope")]
    OutOfScope { intent_uid: String },

    /// Token is missing required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: String },

    /// Token claims could not be evaluated.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
