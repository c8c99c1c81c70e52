//! Sample real-estate intents served by `uim provider`.

use crate::error::ProviderError;
use crate::registry::{IntentHandler, IntentRegistry};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use uim_core::{IntentDescriptor, ParamSpec, ParamType};

const RATE_LIMIT: &str = "1000/hour";

/// Register `SearchProperty` and `GetPropertyDetails` under `service_name`.
pub fn register(registry: &mut IntentRegistry, service_name: &str) {
    registry.register(
        IntentDescriptor {
            intent_uid: format!("{service_name}:searchProperty:v1"),
            intent_name: "SearchProperty".to_string(),
            description: "Searches properties based on location, price range, and property type."
                .to_string(),
            input_parameters: vec![
                ParamSpec::new("location", ParamType::String, true),
                ParamSpec::new("min_price", ParamType::Integer, false),
                ParamSpec::new("max_price", ParamType::Integer, false),
                ParamSpec::new("property_type", ParamType::String, false)
                    .with_description("e.g. apartment, house"),
            ],
            output_parameters: vec![
                ParamSpec::new("properties", ParamType::Array, true),
                ParamSpec::new("total_results", ParamType::Integer, true),
            ],
            endpoint: String::new(),
            tags: tags(&["real estate", "search", "property"]),
            rate_limit: Some(RATE_LIMIT.to_string()),
            price: Some("0.00 USD".to_string()),
        },
        Arc::new(SearchProperty),
    );

    registry.register(
        IntentDescriptor {
            intent_uid: format!("{service_name}:getPropertyDetails:v1"),
            intent_name: "GetPropertyDetails".to_string(),
            description:
                "Fetches detailed information for a specific property based on property ID."
                    .to_string(),
            input_parameters: vec![ParamSpec::new("property_id", ParamType::String, true)],
            output_parameters: vec![ParamSpec::new("property_details", ParamType::Object, true)],
            endpoint: String::new(),
            tags: tags(&["real estate", "details", "property"]),
            rate_limit: Some(RATE_LIMIT.to_string()),
            price: Some("0.01 USD".to_string()),
        },
        Arc::new(GetPropertyDetails),
    );
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|t| t.to_string()).collect()
}

fn listing() -> Value {
    json!({
        "property_id": "123",
        "name": "Luxury Apartment",
        "price": 2000,
        "location": "New York",
        "property_type": "apartment"
    })
}

struct SearchProperty;

#[async_trait]
impl IntentHandler for SearchProperty {
    async fn handle(&self, parameters: &Map<String, Value>) -> Result<Value, ProviderError> {
        let location = parameters.get("location").and_then(Value::as_str);
        let property_type = parameters.get("property_type").and_then(Value::as_str);
        let min = parameters.get("min_price").and_then(Value::as_i64);
        let max = parameters.get("max_price").and_then(Value::as_i64);

        let price = 2000;
        let matches = location == Some("New York")
            && property_type.is_none_or(|t| t == "apartment")
            && min.is_none_or(|m| price >= m)
            && max.is_none_or(|m| price <= m);

        let properties: Vec<Value> = if matches { vec![listing()] } else { Vec::new() };
        Ok(json!({
            "total_results": properties.len(),
            "properties": properties,
        }))
    }
}

struct GetPropertyDetails;

#[async_trait]
impl IntentHandler for GetPropertyDetails {
    async fn handle(&self, parameters: &Map<String, Value>) -> Result<Value, ProviderError> {
        let details = match parameters.get("property_id").and_then(Value::as_str) {
            Some("123") => {
                let mut details = listing();
                details["description"] =
                    json!("A luxurious apartment in the heart of New York.");
                details
            }
            _ => json!({}),
        };
        Ok(json!({ "property_details": details }))
    }
}
