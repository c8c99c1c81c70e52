//! Agent-side errors.

use thiserror::Error;
use uim_policy::PolicyError;

/// Errors raised while talking to a provider or managing handshake state.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A request exceeded the configured timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The provider rejected the request.
    ///
    /// `reason` is the provider's machine-readable code (e.g. `expired`,
    /// `out_of_scope`) when it sent one.
    #[error("{url} returned status {status}: {detail}")]
    Rejected {
        url: String,
        status: u16,
        reason: Option<String>,
        detail: String,
    },

    /// A response body did not decode.
    #[error("undecodable response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The policy could not be parsed or signed.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// A key file could not be read or written.
    #[error("key store error at {path}: {reason}")]
    KeyStore { path: String, reason: String },

    /// A handshake step was attempted out of order.
    #[error("handshake is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// The provider's manifest does not publish this intent.
    #[error("intent {0} is not published by this provider")]
    UnknownIntent(String),

    /// A URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl AgentError {
    /// The provider's rejection reason, if this is a rejection.
    pub fn reason(&self) -> Option<&str> {
        match self {
            AgentError::Rejected { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying later could help. Authorization rejections are
    /// deliberate decisions and are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Network(_) | AgentError::Timeout { .. } => true,
            AgentError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
