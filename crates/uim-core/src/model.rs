//! Catalog entities and the typed parameter schema.
//!
//! Entities are plain records keyed by database id or unique name. There are
//! no back-references between them: an [`Intent`] names its owning service by
//! `service_id` and its tags by name, and the catalog store resolves the rest.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A service that publishes intents. `name` is its stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_url: Option<String>,
}

/// An invocable capability owned by exactly one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: i64,
    pub service_id: i64,
    pub intent_uid: String,
    pub name: String,
    pub description: String,
    pub input_parameters: Vec<ParamSpec>,
    pub output_parameters: Vec<ParamSpec>,
    pub endpoint: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A free-text label shared across intents. Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Parsed form of `<service-domain>:<name>:<version>`.
///
/// The domain may itself contain `:` (for example `localhost:4000`), so the
/// uid is split from the right.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntentUid {
    pub domain: String,
    pub name: String,
    pub version: String,
}

impl IntentUid {
    pub fn parse(uid: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidIntentUid {
            uid: uid.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = uid.rsplitn(3, ':');
        let version = parts.next().unwrap_or_default();
        let name = parts.next().ok_or_else(|| invalid("missing name segment"))?;
        let domain = parts.next().ok_or_else(|| invalid("missing domain segment"))?;

        if domain.is_empty() || name.is_empty() || version.is_empty() {
            return Err(invalid("segments must be non-empty"));
        }
        if uid.chars().any(char::is_whitespace) {
            return Err(invalid("whitespace is not allowed"));
        }

        Ok(Self {
            domain: domain.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for IntentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.domain, self.name, self.version)
    }
}

/// Declared type of an intent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// No usable type information was published; any value is accepted.
    Any,
}

impl ParamType {
    /// Interpret a published type tag. Unknown tags map to [`ParamType::Any`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Self::String,
            "integer" | "int" => Self::Integer,
            "number" | "float" | "decimal" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "object" | "dict" => Self::Object,
            "array" | "list" => Self::Array,
            _ => Self::Any,
        }
    }

    /// Whether a call-time value is well-typed for this declaration.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared input or output parameter of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type,
            required,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Published parameter lists come in two shapes: an ordered list of
/// `{name, type, required, description}` or a JSON-schema `properties`
/// object. Both decode to `Vec<ParamSpec>`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParamsWire {
    List(Vec<ParamWire>),
    Properties(BTreeMap<String, Value>),
}

#[derive(Deserialize)]
struct ParamWire {
    name: String,
    #[serde(rename = "type", default)]
    param_type: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Serde adapter accepting either parameter shape.
pub fn deserialize_params<'de, D>(deserializer: D) -> Result<Vec<ParamSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<ParamsWire>::deserialize(deserializer)?;
    Ok(match wire {
        None => Vec::new(),
        Some(ParamsWire::List(items)) => items
            .into_iter()
            .map(|p| ParamSpec {
                name: p.name,
                param_type: p
                    .param_type
                    .as_deref()
                    .map(ParamType::from_tag)
                    .unwrap_or(ParamType::Any),
                required: p.required,
                description: p.description,
            })
            .collect(),
        Some(ParamsWire::Properties(props)) => props
            .into_iter()
            .map(|(name, schema)| property_to_param(name, &schema))
            .collect(),
    })
}

// A property without a `default` is required; nullable unions use the first
// non-null member's type.
fn property_to_param(name: String, schema: &Value) -> ParamSpec {
    let direct = schema.get("type").and_then(Value::as_str);
    let from_union = || {
        schema
            .get("anyOf")
            .and_then(Value::as_array)
            .and_then(|members| {
                members
                    .iter()
                    .filter_map(|m| m.get("type").and_then(Value::as_str))
                    .find(|t| *t != "null")
            })
    };
    let param_type = direct
        .or_else(from_union)
        .map(ParamType::from_tag)
        .unwrap_or(ParamType::Any);

    ParamSpec {
        name,
        param_type,
        required: schema.get("default").is_none(),
        description: schema
            .get("description")
            .or_else(|| schema.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
