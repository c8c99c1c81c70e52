//! Execution gate: no intent runs without a valid, in-scope token.

use crate::error::ProviderError;
use crate::registry::{IntentRegistry, RegisteredIntent};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uim_pat::{AuthorizationToken, GrantedScope, TokenVerifier};
use uim_policy::Policy;

/// Header carrying the token when `Authorization: Bearer` is not used.
pub const PAT_HEADER: &str = "uim-pat";

/// Body of `POST /uim/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub intent_uid: String,
    #[serde(default)]
    pub parameters: Value,
}

impl ExecuteRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
        let present = value
            .get("intent_uid")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(ProviderError::MissingField("intent_uid".into()));
        }
        serde_json::from_value(value).map_err(|e| ProviderError::InvalidRequest(e.to_string()))
    }
}

/// Pull the token from `Authorization: Bearer <t>` or the `uim-pat` header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    bearer
        .or_else(|| headers.get(PAT_HEADER).and_then(|v| v.to_str().ok()).map(str::trim))
        .filter(|t| !t.is_empty())
}

/// Checks token integrity, validity window and scope before dispatch.
#[derive(Clone)]
pub struct ExecutionGate {
    verifier: TokenVerifier,
    policy: Arc<Policy>,
    registry: Arc<IntentRegistry>,
}

impl ExecutionGate {
    pub fn new(verifier: TokenVerifier, policy: Arc<Policy>, registry: Arc<IntentRegistry>) -> Self {
        Self {
            verifier,
            policy,
            registry,
        }
    }

    /// Verify the token alone. Integrity and expiry are checked before
    /// anything about the request is looked at.
    pub fn check_token(&self, token: Option<&str>) -> Result<AuthorizationToken, ProviderError> {
        let token = token.ok_or(ProviderError::MissingToken)?;
        Ok(self.verifier.verify(token)?)
    }

    /// Authorize a call of `intent_uid` with the given claims.
    pub fn check_scope<'a>(
        &'a self,
        claims: &AuthorizationToken,
        intent_uid: &str,
    ) -> Result<&'a RegisteredIntent, ProviderError> {
        let intent = self
            .registry
            .get(intent_uid)
            .ok_or_else(|| ProviderError::UnknownIntent(intent_uid.to_string()))?;

        let in_scope = match &claims.scope {
            GrantedScope::Policy { policy_id } => {
                policy_id == &self.policy.id
                    && self.policy.permits(&self.registry.asset_id(&intent.descriptor))
            }
            GrantedScope::Intents { intent_uids } => intent_uids.contains(intent_uid),
        };
        if !in_scope {
            return Err(ProviderError::OutOfScope(intent_uid.to_string()));
        }

        debug!(token_id = %claims.id, intent_uid, "execution authorized");
        Ok(intent)
    }

    /// Gate then dispatch.
    pub async fn execute(
        &self,
        token: Option<&str>,
        body: &[u8],
    ) -> Result<Value, ProviderError> {
        let claims = self.check_token(token)?;
        let request = ExecuteRequest::from_slice(body)?;
        self.check_scope(&claims, &request.intent_uid)?;
        self.registry
            .dispatch(&request.intent_uid, request.parameters)
            .await
    }
}
