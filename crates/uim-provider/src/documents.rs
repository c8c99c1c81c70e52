//! The manifest and usage policy a provider publishes.

use crate::error::ProviderError;
use crate::registry::IntentRegistry;
use serde_json::json;
use uim_core::{Compliance, Manifest, ProviderConfig, ServiceInfo};
use uim_policy::document::{
    ACTION_EXECUTE, FUNCTION_ASSIGNEE, FUNCTION_ASSIGNER, IdRef, ODRL_CONTEXT, ODRL_PROFILE,
};
use uim_policy::{Action, Asset, Duty, DutyAction, Party, Policy, Refinement, Rule, Targets};

/// Build `agents.json` from the registered intents.
pub fn build_manifest(
    config: &ProviderConfig,
    registry: &IntentRegistry,
    public_key: Option<String>,
) -> Manifest {
    let base = registry.base_url();
    Manifest {
        service_info: ServiceInfo {
            name: config.service_name.clone(),
            description: config.service_description.clone(),
            service_url: base.to_string(),
            service_logo_url: Some(format!("{base}/logo.png")),
            service_terms_of_service_url: Some(format!("{base}/terms")),
            service_privacy_policy_url: Some(format!("{base}/privacy")),
        },
        intents: registry.iter().map(|i| i.descriptor.clone()).collect(),
        public_key,
        policy_url: Some(format!("{base}/uim-policy.json")),
        discovery_url: Some(format!("{base}/uim/intents/search")),
        execute_url: Some(format!("{base}/uim/execute")),
        compliance: Some(Compliance {
            standards: vec!["ISO27001".to_string(), "GDPR".to_string()],
            regional_compliance: [
                ("EU".to_string(), "GDPR".to_string()),
                ("US-CA".to_string(), "CCPA".to_string()),
            ]
            .into_iter()
            .collect(),
            notes: Some("Data is encrypted in transit and at rest.".to_string()),
        }),
        license: config.license.clone(),
    }
}

/// Build the usage policy: one execute permission per intent, refined by its
/// published rate limit and carrying a compensation duty when it has a price.
/// Calls above a rate limit are prohibited, with one prohibition per
/// distinct limit.
pub fn build_policy(registry: &IntentRegistry) -> Result<Policy, ProviderError> {
    let base = registry.base_url();
    let mut permission = Vec::new();
    // Keyed by (count, unit), in first-seen order.
    let mut limits: Vec<((u64, String), Vec<String>)> = Vec::new();

    for intent in registry.iter() {
        let target = registry.asset_id(&intent.descriptor);

        let mut refinement = Vec::new();
        if let Some((count, unit)) = intent.descriptor.rate_limit.as_deref().and_then(parse_rate_limit) {
            refinement.push(count_refinement("odrl:lteq", count, &unit));
            let key = (count, unit);
            match limits.iter_mut().find(|(limit, _)| *limit == key) {
                Some((_, targets)) => targets.push(target.clone()),
                None => limits.push((key, vec![target.clone()])),
            }
        }

        let duty = intent
            .descriptor
            .price
            .as_deref()
            .and_then(parse_price)
            .map(|(amount, currency)| Duty {
                action: vec![DutyAction {
                    value: IdRef {
                        id: "odrl:compensate".to_string(),
                    },
                    refinement: vec![Refinement {
                        left_operand: "payAmount".to_string(),
                        operator: "eq".to_string(),
                        right_operand: json!({"@value": amount, "@type": "xsd:decimal"}),
                        unit: Some(currency_unit(&currency)),
                    }],
                }],
            })
            .into_iter()
            .collect();

        permission.push(Rule {
            target: Targets::One(target),
            action: Action {
                id: ACTION_EXECUTE.to_string(),
                refinement,
            },
            duty,
        });
    }

    let prohibition = limits
        .into_iter()
        .map(|((count, unit), targets)| Rule {
            target: Targets::Many(targets),
            action: Action {
                id: ACTION_EXECUTE.to_string(),
                refinement: vec![count_refinement("odrl:gt", count, &unit)],
            },
            duty: Vec::new(),
        })
        .collect();

    let policy = Policy {
        context: ODRL_CONTEXT.to_string(),
        policy_type: "odrl:Set".to_string(),
        id: format!("{base}/uim-policy"),
        profile: ODRL_PROFILE.to_string(),
        permission,
        prohibition,
        party: vec![
            Party {
                function: FUNCTION_ASSIGNER.to_string(),
                identifier: format!("{base}/assigner"),
            },
            Party {
                function: FUNCTION_ASSIGNEE.to_string(),
                identifier: format!("{base}/assignee"),
            },
        ],
        asset: registry
            .iter()
            .map(|i| Asset {
                id: registry.asset_id(&i.descriptor),
                asset_type: "odrl:Asset".to_string(),
            })
            .collect(),
    };
    policy.validate()?;
    Ok(policy)
}

fn count_refinement(operator: &str, count: u64, unit: &str) -> Refinement {
    Refinement {
        left_operand: "odrl:count".to_string(),
        operator: operator.to_string(),
        right_operand: json!(count),
        unit: Some(format!("odrl:{unit}")),
    }
}

/// `"1000/hour"` → `(1000, "hour")`.
fn parse_rate_limit(raw: &str) -> Option<(u64, String)> {
    let (count, unit) = raw.split_once('/')?;
    let count = count.trim().parse().ok()?;
    let unit = unit.trim().to_ascii_lowercase();
    (!unit.is_empty()).then_some((count, unit))
}

/// `"0.01 USD"` → `("0.01", "USD")`. Zero prices carry no duty.
fn parse_price(raw: &str) -> Option<(String, String)> {
    let mut parts = raw.split_whitespace();
    let amount = parts.next()?;
    let currency = parts.next().unwrap_or("USD");
    let value: f64 = amount.parse().ok()?;
    (value > 0.0).then(|| (amount.to_string(), currency.to_ascii_uppercase()))
}

fn currency_unit(code: &str) -> String {
    match code {
        "EUR" => "http://dbpedia.org/resource/Euro".to_string(),
        "USD" => "http://dbpedia.org/resource/United_States_dollar".to_string(),
        other => other.to_string(),
    }
}
