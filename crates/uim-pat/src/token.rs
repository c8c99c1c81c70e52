//! Token issuance and verification.

use crate::claims::{AuthorizationToken, GrantedScope};
use crate::error::PatError;
use crate::keys::KeyPair;
use biscuit_auth::builder::{AuthorizerBuilder, Rule};
use biscuit_auth::macros::fact;
use biscuit_auth::{Authorizer, Biscuit, PublicKey, UnverifiedBiscuit};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;

/// A freshly minted token and the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: AuthorizationToken,
}

/// Mints PATs with the provider key.
#[derive(Clone)]
pub struct TokenIssuer {
    keypair: KeyPair,
}

impl TokenIssuer {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// The verifier matching this issuer's key.
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::for_keypair(&self.keypair)
    }

    /// Mint a token valid from now for `ttl`.
    pub fn issue(
        &self,
        agent_id: &str,
        scope: GrantedScope,
        ttl: std::time::Duration,
    ) -> Result<IssuedToken, PatError> {
        let ttl = Duration::from_std(ttl).map_err(|_| PatError::InvalidValidity)?;
        let now = Utc::now();
        self.issue_with_validity(agent_id, scope, now, now + ttl)
    }

    /// Mint a token with an explicit validity window.
    pub fn issue_with_validity(
        &self,
        agent_id: &str,
        scope: GrantedScope,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<IssuedToken, PatError> {
        // Timestamps are stored at second precision.
        let valid_from = truncate(valid_from)?;
        let valid_to = truncate(valid_to)?;
        if valid_to <= valid_from {
            return Err(PatError::InvalidValidity);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let creation = |e: biscuit_auth::error::Token| PatError::TokenCreationFailed(e.to_string());

        let mut builder = Biscuit::builder()
            .fact(fact!("token_id({id})", id = id.clone()))
            .map_err(creation)?
            .fact(fact!("issued_to({agent})", agent = agent_id.to_string()))
            .map_err(creation)?
            .fact(fact!("valid_from({ts})", ts = valid_from.timestamp()))
            .map_err(creation)?
            .fact(fact!("valid_to({ts})", ts = valid_to.timestamp()))
            .map_err(creation)?;

        match &scope {
            GrantedScope::Policy { policy_id } => {
                builder = builder
                    .fact(fact!("policy({policy})", policy = policy_id.clone()))
                    .map_err(creation)?;
            }
            GrantedScope::Intents { intent_uids } => {
                for uid in intent_uids {
                    builder = builder
                        .fact(fact!("intent({uid})", uid = uid.clone()))
                        .map_err(creation)?;
                }
            }
        }

        let biscuit = builder.build(self.keypair.inner()).map_err(creation)?;
        let token = biscuit
            .to_base64()
            .map_err(|e| PatError::TokenCreationFailed(e.to_string()))?;

        debug!(token_id = %id, agent_id, valid_to = %valid_to, "minted PAT");

        Ok(IssuedToken {
            token,
            claims: AuthorizationToken {
                id,
                issued_to: agent_id.to_string(),
                scope,
                valid_from,
                valid_to,
            },
        })
    }
}

/// Verifies PATs: integrity first, then the validity window.
///
/// Scope is checked by the caller against the requested intent, since a
/// policy-scoped token needs the provider's policy to resolve.
#[derive(Clone)]
pub struct TokenVerifier {
    public_key: PublicKey,
}

impl TokenVerifier {
    pub fn for_keypair(keypair: &KeyPair) -> Self {
        Self {
            public_key: keypair.public_key(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthorizationToken, PatError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthorizationToken, PatError> {
        let token = token.trim();

        // Distinguish an undecodable credential from one signed by another key.
        UnverifiedBiscuit::from_base64(token).map_err(|e| PatError::Malformed(e.to_string()))?;
        let biscuit = Biscuit::from_base64(token, self.public_key.clone())
            .map_err(|e| PatError::InvalidSignature(e.to_string()))?;

        let mut authorizer = AuthorizerBuilder::new()
            .code("allow if true;")
            .map_err(|e| PatError::VerificationFailed(e.to_string()))?
            .build(&biscuit)
            .map_err(|e| PatError::VerificationFailed(e.to_string()))?;
        authorizer
            .authorize()
            .map_err(|e| PatError::VerificationFailed(e.to_string()))?;

        let id = single_string(&mut authorizer, "token_id")?;
        let issued_to = single_string(&mut authorizer, "issued_to")?;
        let valid_from = timestamp(&mut authorizer, "valid_from")?;
        let valid_to = timestamp(&mut authorizer, "valid_to")?;

        let scope = match strings(&mut authorizer, "policy")?.into_iter().next() {
            Some(policy_id) => GrantedScope::Policy { policy_id },
            None => GrantedScope::intents(strings(&mut authorizer, "intent")?),
        };

        let claims = AuthorizationToken {
            id,
            issued_to,
            scope,
            valid_from,
            valid_to,
        };

        if claims.is_expired_at(now) {
            return Err(PatError::Expired {
                valid_to: claims.valid_to.to_rfc3339(),
            });
        }
        if now < claims.valid_from {
            return Err(PatError::NotYetValid {
                valid_from: claims.valid_from.to_rfc3339(),
            });
        }

        Ok(claims)
    }
}

fn truncate(ts: DateTime<Utc>) -> Result<DateTime<Utc>, PatError> {
    Utc.timestamp_opt(ts.timestamp(), 0)
        .single()
        .ok_or(PatError::InvalidValidity)
}

fn rule(name: &str) -> Result<Rule, PatError> {
    format!("data($x) <- {}($x)", name)
        .parse()
        .map_err(|e: biscuit_auth::error::Token| PatError::VerificationFailed(e.to_string()))
}

fn strings(authorizer: &mut Authorizer, name: &str) -> Result<Vec<String>, PatError> {
    let results: Vec<(String,)> = authorizer
        .query(rule(name)?)
        .map_err(|e| PatError::VerificationFailed(e.to_string()))?;
    Ok(results.into_iter().map(|(s,)| s).collect())
}

fn single_string(authorizer: &mut Authorizer, name: &str) -> Result<String, PatError> {
    strings(authorizer, name)?
        .into_iter()
        .next()
        .ok_or_else(|| PatError::MissingClaim {
            claim: name.to_string(),
        })
}

fn timestamp(authorizer: &mut Authorizer, name: &str) -> Result<DateTime<Utc>, PatError> {
    let results: Vec<(i64,)> = authorizer
        .query(rule(name)?)
        .map_err(|e| PatError::VerificationFailed(e.to_string()))?;
    let (secs,) = results.into_iter().next().ok_or_else(|| PatError::MissingClaim {
        claim: name.to_string(),
    })?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| PatError::VerificationFailed(format!("{} out of range", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID_A: &str = "localhost:4000:SearchProperty:v1";
    const UID_B: &str = "localhost:4000:GetPropertyDetails:v1";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(KeyPair::generate().unwrap())
    }

    #[test]
    fn test_issue_and_verify_policy_scope() {
        let issuer = issuer();
        let issued = issuer
            .issue(
                "ai-agent-1",
                GrantedScope::Policy {
                    policy_id: "http://localhost:4000/uim-policy".into(),
                },
                std::time::Duration::from_secs(3600),
            )
            .unwrap();

        let claims = issuer.verifier().verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert!(claims.valid_to > claims.valid_from);
    }

    #[test]
    fn test_issue_and_verify_intent_scope() {
        let issuer = issuer();
        let issued = issuer
            .issue(
                "ai-agent-1",
                GrantedScope::intents([UID_A, UID_B]),
                std::time::Duration::from_secs(60),
            )
            .unwrap();

        let claims = issuer.verifier().verify(&issued.token).unwrap();
        assert_eq!(claims.scope, GrantedScope::intents([UID_B, UID_A]));
        assert_eq!(claims.issued_to, "ai-agent-1");
    }

    #[test]
    fn test_token_ids_are_unique() {
        let issuer = issuer();
        let ttl = std::time::Duration::from_secs(60);
        let a = issuer.issue("a", GrantedScope::intents([UID_A]), ttl).unwrap();
        let b = issuer.issue("a", GrantedScope::intents([UID_A]), ttl).unwrap();
        assert_ne!(a.claims.id, b.claims.id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer
            .issue_with_validity(
                "ai-agent-1",
                GrantedScope::intents([UID_A]),
                now - Duration::days(2),
                now - Duration::days(1),
            )
            .unwrap();

        let err = issuer.verifier().verify(&issued.token).unwrap_err();
        assert!(matches!(err, PatError::Expired { .. }));
    }

    #[test]
    fn test_not_yet_valid_rejected() {
        let issuer = issuer();
        let now = Utc::now();
        let issued = issuer
            .issue_with_validity(
                "ai-agent-1",
                GrantedScope::intents([UID_A]),
                now + Duration::hours(1),
                now + Duration::hours(2),
            )
            .unwrap();

        let err = issuer.verifier().verify_at(&issued.token, now).unwrap_err();
        assert!(matches!(err, PatError::NotYetValid { .. }));
    }

    #[test]
    fn test_inverted_validity_rejected() {
        let now = Utc::now();
        let err = issuer()
            .issue_with_validity("a", GrantedScope::intents([UID_A]), now, now)
            .unwrap_err();
        assert!(matches!(err, PatError::InvalidValidity));
    }

    #[test]
    fn test_foreign_key_is_invalid_signature() {
        let issued = issuer()
            .issue("a", GrantedScope::intents([UID_A]), std::time::Duration::from_secs(60))
            .unwrap();

        let err = issuer().verifier().verify(&issued.token).unwrap_err();
        assert!(matches!(err, PatError::InvalidSignature(_)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = issuer().verifier().verify("not a token").unwrap_err();
        assert!(matches!(err, PatError::Malformed(_)));
    }
}
