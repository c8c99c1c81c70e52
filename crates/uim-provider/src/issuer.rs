//! Authorization issuer: signed policy in, PAT out.

use crate::error::ProviderError;
use crate::registry::IntentRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uim_pat::{GrantedScope, IssuedToken, TokenIssuer};
use uim_policy::{Policy, SignedPolicy, verify_signed_policy};

/// Body of `POST /pat/issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatRequest {
    pub agent_id: String,
    pub signed_policy: SignedPolicy,
    /// base64url SPKI PEM of the agent key.
    pub agent_public_key: String,
}

impl PatRequest {
    /// Parse a request body, naming the first missing or empty field.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProviderError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;

        for field in ["agent_id", "signed_policy", "agent_public_key"] {
            match value.get(field) {
                None | Some(Value::Null) => return Err(ProviderError::MissingField(field.into())),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(ProviderError::MissingField(field.into()));
                }
                _ => {}
            }
        }
        for field in ["policy_payload", "signature", "signer_public_key"] {
            let present = value["signed_policy"]
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !present {
                return Err(ProviderError::MissingField(format!("signed_policy.{field}")));
            }
        }

        serde_json::from_value(value).map_err(|e| ProviderError::InvalidRequest(e.to_string()))
    }
}

/// Body returned by `POST /pat/issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatResponse {
    pub token: String,
    pub valid_to: String,
}

impl From<&IssuedToken> for PatResponse {
    fn from(issued: &IssuedToken) -> Self {
        Self {
            token: issued.token.clone(),
            valid_to: issued.claims.valid_to.to_rfc3339(),
        }
    }
}

/// Verifies an agent's signature over the served policy and mints a token.
#[derive(Clone)]
pub struct AuthorizationIssuer {
    tokens: TokenIssuer,
    policy: Arc<Policy>,
    registry: Arc<IntentRegistry>,
    ttl: Duration,
    policy_scoped: bool,
}

impl AuthorizationIssuer {
    pub fn new(
        tokens: TokenIssuer,
        policy: Arc<Policy>,
        registry: Arc<IntentRegistry>,
        ttl: Duration,
        policy_scoped: bool,
    ) -> Self {
        Self {
            tokens,
            policy,
            registry,
            ttl,
            policy_scoped,
        }
    }

    /// Issue a token for a verified agreement. Nothing is minted when the
    /// signature or payload does not check out.
    pub fn issue(&self, request: &PatRequest) -> Result<IssuedToken, ProviderError> {
        let verified = verify_signed_policy(
            &request.signed_policy,
            &self.policy,
            &request.agent_public_key,
        )?;

        let scope = if self.policy_scoped {
            GrantedScope::Policy {
                policy_id: verified.policy.id.clone(),
            }
        } else {
            GrantedScope::intents(
                self.registry
                    .iter()
                    .filter(|i| verified.policy.permits(&self.registry.asset_id(&i.descriptor)))
                    .map(|i| i.descriptor.intent_uid.clone()),
            )
        };

        let issued = self.tokens.issue(&request.agent_id, scope, self.ttl)?;
        info!(
            agent_id = %request.agent_id,
            token_id = %issued.claims.id,
            valid_to = %issued.claims.valid_to,
            "authorization token issued"
        );
        Ok(issued)
    }
}
