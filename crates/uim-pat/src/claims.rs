//! Claims carried by an authorization token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a token permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GrantedScope {
    /// Whatever the referenced policy permits.
    Policy { policy_id: String },
    /// An explicit set of intent uids.
    Intents { intent_uids: BTreeSet<String> },
}

impl GrantedScope {
    pub fn intents<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Intents {
            intent_uids: uids.into_iter().map(Into::into).collect(),
        }
    }
}

/// The verified contents of a PAT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub id: String,
    pub issued_to: String,
    pub scope: GrantedScope,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl AuthorizationToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_to
    }
}
