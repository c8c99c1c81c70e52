//! Registered intents and dispatch.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uim_core::{IntentDescriptor, ParamSpec};

/// Business logic behind one intent.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Run the intent. Parameters have already been checked against the
    /// declared input schema.
    async fn handle(&self, parameters: &Map<String, Value>) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct RegisteredIntent {
    pub descriptor: IntentDescriptor,
    pub handler: Arc<dyn IntentHandler>,
}

/// The provider's intents, in registration order.
#[derive(Clone)]
pub struct IntentRegistry {
    base_url: String,
    intents: Vec<RegisteredIntent>,
    by_uid: HashMap<String, usize>,
}

impl IntentRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            intents: Vec::new(),
            by_uid: HashMap::new(),
        }
    }

    /// Register an intent, replacing any previous one with the same uid.
    pub fn register(&mut self, descriptor: IntentDescriptor, handler: Arc<dyn IntentHandler>) {
        let uid = descriptor.intent_uid.clone();
        let entry = RegisteredIntent { descriptor, handler };
        match self.by_uid.get(&uid) {
            Some(&index) => self.intents[index] = entry,
            None => {
                self.by_uid.insert(uid, self.intents.len());
                self.intents.push(entry);
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get(&self, intent_uid: &str) -> Option<&RegisteredIntent> {
        self.by_uid.get(intent_uid).map(|&i| &self.intents[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredIntent> {
        self.intents.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Policy asset id governing an intent.
    pub fn asset_id(&self, descriptor: &IntentDescriptor) -> String {
        format!("{}/uim/execute/{}", self.base_url, descriptor.intent_name)
    }

    /// Validate parameters, run the handler and project its output onto the
    /// declared output parameters.
    pub async fn dispatch(&self, intent_uid: &str, parameters: Value) -> Result<Value, ProviderError> {
        let intent = self
            .get(intent_uid)
            .ok_or_else(|| ProviderError::UnknownIntent(intent_uid.to_string()))?;

        let parameters = match parameters {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ProviderError::InvalidParameters(format!(
                    "parameters must be an object, got {}",
                    type_name(&other)
                )));
            }
        };
        check_parameters(&intent.descriptor.input_parameters, &parameters)?;

        debug!(intent_uid, "dispatching intent");
        let output = intent.handler.handle(&parameters).await?;
        Ok(project_output(&intent.descriptor.output_parameters, output))
    }
}

/// Every required parameter must be present and non-null; every supplied
/// declared parameter must be well-typed. Undeclared parameters are ignored.
pub fn check_parameters(specs: &[ParamSpec], parameters: &Map<String, Value>) -> Result<(), ProviderError> {
    let missing: Vec<&str> = specs
        .iter()
        .filter(|s| s.required && parameters.get(&s.name).is_none_or(Value::is_null))
        .map(|s| s.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ProviderError::InvalidParameters(format!(
            "missing required parameter(s): {}",
            missing.join(", ")
        )));
    }

    for spec in specs {
        if let Some(value) = parameters.get(&spec.name).filter(|v| !v.is_null()) {
            if !spec.param_type.accepts(value) {
                return Err(ProviderError::InvalidParameters(format!(
                    "parameter {} must be of type {}, got {}",
                    spec.name,
                    spec.param_type,
                    type_name(value)
                )));
            }
        }
    }
    Ok(())
}

/// Keep only declared output fields. Without a declaration the output is
/// returned unchanged.
pub fn project_output(specs: &[ParamSpec], output: Value) -> Value {
    match output {
        Value::Object(mut map) if !specs.is_empty() => {
            map.retain(|key, _| specs.iter().any(|s| &s.name == key));
            Value::Object(map)
        }
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
