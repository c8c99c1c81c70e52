//! ODRL-style usage policy document.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const ODRL_CONTEXT: &str = "http://www.w3.org/ns/odrl.jsonld";
pub const ODRL_PROFILE: &str = "http://www.w3.org/ns/odrl/2/core";
pub const ACTION_EXECUTE: &str = "odrl:execute";
pub const FUNCTION_ASSIGNER: &str = "odrl:assigner";
pub const FUNCTION_ASSIGNEE: &str = "odrl:assignee";

/// A rights document enumerating permitted and prohibited actions.
///
/// Once fetched for a handshake the document is never mutated; its
/// [`canonical_bytes`](Policy::canonical_bytes) are what the agent signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub policy_type: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub profile: String,
    pub permission: Vec<Rule>,
    pub prohibition: Vec<Rule>,
    pub party: Vec<Party>,
    pub asset: Vec<Asset>,
}

/// A permission or prohibition over one or more targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub target: Targets,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duty: Vec<Duty>,
}

/// ODRL allows a single target IRI or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    One(String),
    Many(Vec<String>),
}

impl Targets {
    pub fn contains(&self, target: &str) -> bool {
        match self {
            Targets::One(t) => t == target,
            Targets::Many(ts) => ts.iter().any(|t| t == target),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Targets::One(t) => std::slice::from_ref(t),
            Targets::Many(ts) => ts,
        };
        slice.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinement: Vec<Refinement>,
}

/// A numeric or value constraint such as `odrl:count lteq 1000 per hour`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    #[serde(rename = "leftOperand")]
    pub left_operand: String,
    pub operator: String,
    #[serde(rename = "rightOperand")]
    pub right_operand: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A compensation obligation attached to a permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duty {
    pub action: Vec<DutyAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyAction {
    #[serde(rename = "rdf:value")]
    pub value: IdRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinement: Vec<Refinement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(rename = "@id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub function: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: String,
}

impl Policy {
    /// Parse and validate a fetched policy document.
    pub fn from_value(value: Value) -> Result<Self, PolicyError> {
        let policy: Policy =
            serde_json::from_value(value).map_err(|e| PolicyError::Malformed(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parse and validate a policy from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let policy: Policy =
            serde_json::from_str(raw).map_err(|e| PolicyError::Malformed(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// A usable policy grants something, to someone, over something.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.id.trim().is_empty() {
            return Err(PolicyError::Malformed("missing @id".to_string()));
        }
        if self.permission.is_empty() {
            return Err(PolicyError::Malformed("permission section is empty".to_string()));
        }
        if self.party.is_empty() {
            return Err(PolicyError::Malformed("party section is empty".to_string()));
        }
        if self.asset.is_empty() {
            return Err(PolicyError::Malformed("asset section is empty".to_string()));
        }
        Ok(())
    }

    /// Deterministic byte form used for signing and verification.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Whether executing `target` is permitted.
    ///
    /// Prohibitions with refinements are conditional (e.g. "more than 1000 per
    /// hour") and do not remove the permission; an unrefined prohibition does.
    pub fn permits(&self, target: &str) -> bool {
        let permitted = self
            .permission
            .iter()
            .any(|r| r.action.id == ACTION_EXECUTE && r.target.contains(target));
        let prohibited = self.prohibition.iter().any(|r| {
            r.action.id == ACTION_EXECUTE && r.action.refinement.is_empty() && r.target.contains(target)
        });
        permitted && !prohibited
    }

    /// Targets this policy permits to execute.
    pub fn permitted_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self
            .permission
            .iter()
            .flat_map(|r| r.target.iter())
            .filter(|t| self.permits(t))
            .collect();
        targets.dedup();
        targets
    }

    /// The `odrl:count` refinement on the permission for `target`, if any.
    pub fn rate_limit(&self, target: &str) -> Option<&Refinement> {
        self.permission
            .iter()
            .filter(|r| r.target.contains(target))
            .flat_map(|r| r.action.refinement.iter())
            .find(|rf| rf.left_operand == "odrl:count")
    }

    pub fn party(&self, function: &str) -> Option<&Party> {
        self.party.iter().find(|p| p.function == function)
    }
}

impl fmt::Display for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left_operand, self.operator, self.right_operand)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Human-readable summary, as shown by `uim agent policy`.
impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Policy {} ({})", self.id, self.policy_type)?;
        writeln!(f, "Profile: {}", self.profile)?;

        writeln!(f, "\nPermissions:")?;
        for rule in &self.permission {
            write_rule(f, rule)?;
            for duty in &rule.duty {
                for action in &duty.action {
                    writeln!(f, "    Duty: {}", action.value.id)?;
                    for rf in &action.refinement {
                        writeln!(f, "      Refinement: {}", rf)?;
                    }
                }
            }
        }

        writeln!(f, "\nProhibitions:")?;
        for rule in &self.prohibition {
            write_rule(f, rule)?;
        }

        writeln!(f, "\nParties:")?;
        for party in &self.party {
            writeln!(f, "- {}: {}", party.function, party.identifier)?;
        }

        writeln!(f, "\nAssets:")?;
        for asset in &self.asset {
            writeln!(f, "- {} ({})", asset.id, asset.asset_type)?;
        }
        Ok(())
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, rule: &Rule) -> fmt::Result {
    let targets: Vec<&str> = rule.target.iter().collect();
    writeln!(f, "- Targets: {}", targets.join(", "))?;
    writeln!(f, "  Action: {}", rule.action.id)?;
    for rf in &rule.action.refinement {
        writeln!(f, "    Refinement: {}", rf)?;
    }
    Ok(())
}
