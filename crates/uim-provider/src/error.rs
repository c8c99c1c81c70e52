//! Provider errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uim_pat::PatError;
use uim_policy::PolicyError;

/// Errors surfaced by the provider endpoints.
///
/// Every rejection carries a distinct machine-readable reason so an agent can
/// tell an expired token from a forged one or an out-of-scope call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required request field is absent or empty.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The request body is not valid JSON of the expected shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The signed policy did not verify; no token is issued.
    #[error("policy verification failed: {0}")]
    PolicyVerification(#[from] PolicyError),

    /// No credential was presented.
    #[error("missing authorization token")]
    MissingToken,

    /// The credential is not a decodable token.
    #[error("malformed authorization token: {0}")]
    MalformedToken(String),

    /// The token's integrity proof does not verify.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// The token is past `valid_to`.
    #[error("token expired at {valid_to}")]
    Expired { valid_to: String },

    /// The token is before `valid_from`.
    #[error("token not valid before {valid_from}")]
    NotYetValid { valid_from: String },

    /// The requested intent is not within the token's scope.
    #[error("intent {0} is outside the token scope")]
    OutOfScope(String),

    /// No such intent is registered.
    #[error("unknown intent: {0}")]
    UnknownIntent(String),

    /// Parameters are missing or ill-typed.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// An intent handler failed.
    #[error("intent execution failed: {0}")]
    Execution(String),

    /// Token minting or provider setup failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProviderError::MissingField(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::PolicyVerification(_)
            | ProviderError::UnknownIntent(_)
            | ProviderError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            ProviderError::MissingToken | ProviderError::MalformedToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ProviderError::InvalidSignature(_)
            | ProviderError::Expired { .. }
            | ProviderError::NotYetValid { .. }
            | ProviderError::OutOfScope(_) => StatusCode::FORBIDDEN,
            ProviderError::Execution(_) | ProviderError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable rejection reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::MissingField(_) => "missing_field",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::PolicyVerification(_) => "policy_verification_failed",
            ProviderError::MissingToken => "missing_token",
            ProviderError::MalformedToken(_) => "malformed_token",
            ProviderError::InvalidSignature(_) => "invalid_signature",
            ProviderError::Expired { .. } => "expired",
            ProviderError::NotYetValid { .. } => "not_yet_valid",
            ProviderError::OutOfScope(_) => "out_of_scope",
            ProviderError::UnknownIntent(_) => "unknown_intent",
            ProviderError::InvalidParameters(_) => "invalid_parameters",
            ProviderError::Execution(_) => "execution_failed",
            ProviderError::Internal(_) => "internal",
        }
    }
}

impl From<PatError> for ProviderError {
    fn from(err: PatError) -> Self {
        match err {
            PatError::Malformed(detail) => ProviderError::MalformedToken(detail),
            PatError::InvalidSignature(detail) | PatError::VerificationFailed(detail) => {
                ProviderError::InvalidSignature(detail)
            }
            PatError::MissingClaim { claim } => {
                ProviderError::InvalidSignature(format!("missing claim {claim}"))
            }
            PatError::Expired { valid_to } => ProviderError::Expired { valid_to },
            PatError::NotYetValid { valid_from } => ProviderError::NotYetValid { valid_from },
            PatError::OutOfScope { intent_uid } => ProviderError::OutOfScope(intent_uid),
            other => ProviderError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(reason = self.reason(), error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.reason(),
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_map_to_distinct_reasons() {
        let expired: ProviderError = PatError::Expired {
            valid_to: "2020-01-01T00:00:00Z".into(),
        }
        .into();
        let forged: ProviderError = PatError::InvalidSignature("bad".into()).into();
        let garbage: ProviderError = PatError::Malformed("bad".into()).into();

        assert_eq!((expired.status(), expired.reason()), (StatusCode::FORBIDDEN, "expired"));
        assert_eq!(
            (forged.status(), forged.reason()),
            (StatusCode::FORBIDDEN, "invalid_signature")
        );
        assert_eq!(
            (garbage.status(), garbage.reason()),
            (StatusCode::UNAUTHORIZED, "malformed_token")
        );
    }

    #[test]
    fn test_application_errors_are_client_errors() {
        assert_eq!(
            ProviderError::UnknownIntent("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProviderError::PolicyVerification(PolicyError::SignatureMismatch).reason(),
            "policy_verification_failed"
        );
    }
}
