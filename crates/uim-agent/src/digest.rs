//! What an agent needs to know from a manifest.

use serde::Serialize;
use std::fmt;
use uim_core::Manifest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentSummary {
    pub intent_uid: String,
    pub name: String,
    pub description: String,
    /// Name of the service publishing the intent.
    pub service: String,
    /// Where this intent is invoked.
    pub endpoint: String,
}

/// Intent metadata and endpoints extracted from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestDigest {
    pub service_name: String,
    pub service_description: String,
    pub service_url: String,
    pub execute_endpoint: Option<String>,
    pub policy_url: Option<String>,
    pub intents: Vec<IntentSummary>,
}

impl ManifestDigest {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let info = &manifest.service_info;
        Self {
            service_name: info.name.clone(),
            service_description: info.description.clone(),
            service_url: info.service_url.clone(),
            execute_endpoint: manifest.execute_url.clone(),
            policy_url: manifest.policy_url.clone(),
            intents: manifest
                .intents
                .iter()
                .map(|i| IntentSummary {
                    intent_uid: i.intent_uid.clone(),
                    name: i.intent_name.clone(),
                    description: i.description.clone(),
                    service: info.name.clone(),
                    endpoint: manifest.endpoint_for(i),
                })
                .collect(),
        }
    }
}

impl fmt::Display for ManifestDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Service: {}", self.service_name)?;
        writeln!(f, "Description: {}", self.service_description)?;
        writeln!(f, "Service URL: {}", self.service_url)?;
        if let Some(endpoint) = &self.execute_endpoint {
            writeln!(f, "Execute endpoint: {endpoint}")?;
        }
        writeln!(f, "\nAvailable intents:")?;
        for intent in &self.intents {
            writeln!(
                f,
                "- {} ({}) [{}]: {}",
                intent.name, intent.service, intent.intent_uid, intent.description
            )?;
        }
        Ok(())
    }
}
