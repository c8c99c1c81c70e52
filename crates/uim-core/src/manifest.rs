//! The `agents.json` manifest a service publishes.

use crate::model::{ParamSpec, deserialize_params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parsed manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "service-info", alias = "service_info")]
    pub service_info: ServiceInfo,

    #[serde(default)]
    pub intents: Vec<IntentDescriptor>,

    /// Service public key as published by the provider.
    #[serde(rename = "uim-public-key", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Where the usage policy document is served.
    #[serde(rename = "uim-policy-file", default, skip_serializing_if = "Option::is_none")]
    pub policy_url: Option<String>,

    #[serde(rename = "uim-api-discovery", default, skip_serializing_if = "Option::is_none")]
    pub discovery_url: Option<String>,

    #[serde(rename = "uim-api-execute", default, skip_serializing_if = "Option::is_none")]
    pub execute_url: Option<String>,

    #[serde(rename = "uim-compliance", default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Compliance>,

    #[serde(rename = "uim-license", default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// Service identity block of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_terms_of_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_privacy_policy_url: Option<String>,
}

/// One intent as published in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDescriptor {
    pub intent_uid: String,
    pub intent_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_params")]
    pub input_parameters: Vec<ParamSpec>,
    #[serde(default, deserialize_with = "deserialize_params")]
    pub output_parameters: Vec<ParamSpec>,
    /// Empty when the manifest only publishes a shared execute endpoint.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// Compliance metadata published alongside the intents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Compliance {
    #[serde(default)]
    pub standards: Vec<String>,
    #[serde(rename = "regional-compliance", default)]
    pub regional_compliance: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Manifest {
    /// Endpoint an intent is invoked through: its own, else the shared one.
    pub fn endpoint_for(&self, intent: &IntentDescriptor) -> String {
        if !intent.endpoint.is_empty() {
            return intent.endpoint.clone();
        }
        self.execute_url.clone().unwrap_or_default()
    }

    pub fn find_intent(&self, intent_uid: &str) -> Option<&IntentDescriptor> {
        self.intents.iter().find(|i| i.intent_uid == intent_uid)
    }
}
