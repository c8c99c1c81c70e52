//! Handshake state for one agent talking to one provider.

use crate::error::AgentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uim_core::Manifest;
use uim_policy::{AgentKeyPair, Policy, PolicySigner, SignedPolicy};

/// Where a session is in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Unauthenticated,
    PolicyFetched,
    PolicySigned,
    TokenIssued,
}

impl HandshakeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandshakeState::Unauthenticated => "unauthenticated",
            HandshakeState::PolicyFetched => "policy_fetched",
            HandshakeState::PolicySigned => "policy_signed",
            HandshakeState::TokenIssued => "token_issued",
        }
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token as returned by `/pat/issue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub valid_to: DateTime<Utc>,
}

/// Explicit handshake context, owned by the caller and threaded through
/// every step.
#[derive(Debug, Clone)]
pub struct HandshakeSession {
    service_url: String,
    agent_id: String,
    manifest: Option<Manifest>,
    policy: Option<Policy>,
    signed: Option<SignedPolicy>,
    grant: Option<TokenGrant>,
}

impl HandshakeSession {
    pub fn new(service_url: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            agent_id: agent_id.into(),
            manifest: None,
            policy: None,
            signed: None,
            grant: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        match (&self.policy, &self.signed, &self.grant) {
            (_, _, Some(_)) => HandshakeState::TokenIssued,
            (_, Some(_), None) => HandshakeState::PolicySigned,
            (Some(_), None, None) => HandshakeState::PolicyFetched,
            (None, None, None) => HandshakeState::Unauthenticated,
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn signed_policy(&self) -> Option<&SignedPolicy> {
        self.signed.as_ref()
    }

    pub fn grant(&self) -> Option<&TokenGrant> {
        self.grant.as_ref()
    }

    pub fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = Some(manifest);
    }

    /// Accept a freshly fetched policy. Any earlier signature or token
    /// belongs to a previous policy instance and is dropped.
    pub fn policy_fetched(&mut self, policy: Policy) {
        self.policy = Some(policy);
        self.signed = None;
        self.grant = None;
    }

    /// Sign the fetched policy.
    pub fn sign(&mut self, key: &AgentKeyPair) -> Result<&SignedPolicy, AgentError> {
        self.expect(HandshakeState::PolicyFetched)?;
        let policy = self.policy.as_ref().ok_or(AgentError::InvalidState {
            expected: HandshakeState::PolicyFetched.as_str(),
            actual: HandshakeState::Unauthenticated.as_str(),
        })?;
        let signed = PolicySigner::new(key).sign(policy)?;
        Ok(self.signed.insert(signed))
    }

    /// Record the token the provider issued for the signed policy.
    pub fn token_issued(&mut self, grant: TokenGrant) -> Result<(), AgentError> {
        self.expect(HandshakeState::PolicySigned)?;
        self.grant = Some(grant);
        Ok(())
    }

    /// The bearer token, once issued.
    pub fn token(&self) -> Option<&str> {
        self.grant.as_ref().map(|g| g.token.as_str())
    }

    /// Whether the token is missing or past its `valid_to`.
    pub fn needs_token_at(&self, now: DateTime<Utc>) -> bool {
        self.grant.as_ref().is_none_or(|g| now > g.valid_to)
    }

    fn expect(&self, expected: HandshakeState) -> Result<(), AgentError> {
        let actual = self.state();
        if actual != expected {
            return Err(AgentError::InvalidState {
                expected: expected.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn policy() -> Policy {
        Policy::from_value(json!({
            "@context": "http://www.w3.org/ns/odrl.jsonld",
            "@type": "odrl:Set",
            "@id": "http://localhost:4000/uim-policy",
            "profile": "http://www.w3.org/ns/odrl/2/core",
            "permission": [{"target": "http://localhost:4000/uim/execute/Search",
                            "action": {"id": "odrl:execute"}}],
            "prohibition": [],
            "party": [{"function": "odrl:assigner", "identifier": "http://localhost:4000/assigner"}],
            "asset": [{"id": "http://localhost:4000/uim/execute/Search", "type": "odrl:Asset"}]
        }))
        .unwrap()
    }

    fn grant(valid_to: DateTime<Utc>) -> TokenGrant {
        TokenGrant {
            token: "t".into(),
            valid_to,
        }
    }

    #[test]
    fn test_states_advance_in_order() {
        let key = AgentKeyPair::generate();
        let mut session = HandshakeSession::new("http://localhost:4000", "ai-agent-1");
        assert_eq!(session.state(), HandshakeState::Unauthenticated);
        assert!(matches!(session.sign(&key), Err(AgentError::InvalidState { .. })));

        session.policy_fetched(policy());
        assert_eq!(session.state(), HandshakeState::PolicyFetched);
        assert!(session.token_issued(grant(Utc::now())).is_err());

        session.sign(&key).unwrap();
        assert_eq!(session.state(), HandshakeState::PolicySigned);

        session.token_issued(grant(Utc::now() + Duration::hours(1))).unwrap();
        assert_eq!(session.state(), HandshakeState::TokenIssued);
        assert_eq!(session.token(), Some("t"));
        assert!(!session.needs_token_at(Utc::now()));
    }

    #[test]
    fn test_refetching_policy_drops_token() {
        let key = AgentKeyPair::generate();
        let mut session = HandshakeSession::new("http://localhost:4000", "ai-agent-1");
        session.policy_fetched(policy());
        session.sign(&key).unwrap();
        session.token_issued(grant(Utc::now() - Duration::hours(1))).unwrap();
        assert!(session.needs_token_at(Utc::now()));

        session.policy_fetched(policy());
        assert_eq!(session.state(), HandshakeState::PolicyFetched);
        assert!(session.token().is_none());
    }
}
