//! End-to-end handshake against the provider router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use uim_core::ProviderConfig;
use uim_pat::{GrantedScope, KeyPair, TokenIssuer};
use uim_policy::{AgentKeyPair, Policy, PolicySigner, decode_public_key};
use uim_provider::{IntentRegistry, Provider, demo};

const SEARCH: &str = "fakerealestate.com:searchProperty:v1";
const DETAILS: &str = "fakerealestate.com:getPropertyDetails:v1";

fn provider(policy_scoped_tokens: bool) -> (Router, KeyPair) {
    let config = ProviderConfig {
        service_name: "fakerealestate.com".into(),
        policy_scoped_tokens,
        ..Default::default()
    };
    let mut registry = IntentRegistry::new(&config.base_url);
    demo::register(&mut registry, &config.service_name);
    let keypair = KeyPair::generate().unwrap();
    let provider = Provider::new(&config, registry, keypair.clone()).unwrap();
    (provider.router(), keypair)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, request.body(Body::from(body.to_string())).unwrap()).await
}

/// Fetch the policy, sign it and exchange it for a token.
async fn handshake(app: &Router) -> String {
    let (status, policy) = get(app, "/uim-policy.json").await;
    assert_eq!(status, StatusCode::OK);
    let policy = Policy::from_value(policy).unwrap();

    let key = AgentKeyPair::generate();
    let signed = PolicySigner::new(&key).sign(&policy).unwrap();
    let (status, body) = post(
        app,
        "/pat/issue",
        None,
        json!({
            "agent_id": "ai-agent-1",
            "signed_policy": signed,
            "agent_public_key": key.public_key_b64url().unwrap(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["valid_to"].is_string());
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_handshake() {
    let (app, _) = provider(true);

    let (status, manifest) = get(&app, "/agents.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manifest["service-info"]["name"], "fakerealestate.com");
    assert_eq!(manifest["intents"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["uim-api-execute"], "http://localhost:4000/uim/execute");
    assert!(decode_public_key(manifest["uim-public-key"].as_str().unwrap()).is_ok());

    let token = handshake(&app).await;
    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&token),
        json!({"intent_uid": SEARCH, "parameters": {"location": "New York", "property_type": "apartment"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total_results"], 1);
}

#[tokio::test]
async fn test_intent_scoped_handshake() {
    let (app, _) = provider(false);
    let token = handshake(&app).await;
    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&token),
        json!({"intent_uid": DETAILS, "parameters": {"property_id": "123"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["property_details"]["property_id"], "123");
}

#[tokio::test]
async fn test_tampered_policy_gets_no_token() {
    let (app, _) = provider(true);
    let (_, policy) = get(&app, "/uim-policy.json").await;
    let policy = Policy::from_value(policy).unwrap();

    let key = AgentKeyPair::generate();
    let mut signed = PolicySigner::new(&key).sign(&policy).unwrap();
    signed.policy_payload = signed.policy_payload.replacen("1000", "999999", 1);

    let (status, body) = post(
        &app,
        "/pat/issue",
        None,
        json!({
            "agent_id": "ai-agent-1",
            "signed_policy": signed,
            "agent_public_key": key.public_key_b64url().unwrap(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "policy_verification_failed");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_issue_requires_fields() {
    let (app, _) = provider(true);
    let (status, body) = post(&app, "/pat/issue", None, json!({"agent_id": "a"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_field");
}

#[tokio::test]
async fn test_missing_and_garbage_tokens_are_unauthorized() {
    let (app, _) = provider(true);
    let call = json!({"intent_uid": SEARCH, "parameters": {"location": "x"}});

    let (status, body) = post(&app, "/uim/execute", None, call.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, body) = post(&app, "/uim/execute", Some("not-a-token"), call).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "malformed_token");
}

#[tokio::test]
async fn test_token_from_another_provider_is_forbidden() {
    let (app, _) = provider(true);
    let foreign = TokenIssuer::new(KeyPair::generate().unwrap())
        .issue("ai-agent-1", GrantedScope::intents([SEARCH]), std::time::Duration::from_secs(60))
        .unwrap();

    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&foreign.token),
        json!({"intent_uid": SEARCH, "parameters": {"location": "x"}}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid_signature");
}

#[tokio::test]
async fn test_expired_token_is_forbidden() {
    let (app, keypair) = provider(true);
    let now = Utc::now();
    let expired = TokenIssuer::new(keypair)
        .issue_with_validity(
            "ai-agent-1",
            GrantedScope::intents([SEARCH]),
            now - Duration::days(2),
            now - Duration::days(1),
        )
        .unwrap();

    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&expired.token),
        json!({"intent_uid": SEARCH, "parameters": {"location": "x"}}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "expired");
}

#[tokio::test]
async fn test_out_of_scope_and_unknown_intents() {
    let (app, keypair) = provider(true);
    let narrow = TokenIssuer::new(keypair)
        .issue("ai-agent-1", GrantedScope::intents([SEARCH]), std::time::Duration::from_secs(60))
        .unwrap();

    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&narrow.token),
        json!({"intent_uid": DETAILS, "parameters": {"property_id": "123"}}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "out_of_scope");

    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&narrow.token),
        json!({"intent_uid": "fakerealestate.com:deleteEverything:v1", "parameters": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_intent");
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request() {
    let (app, _) = provider(true);
    let token = handshake(&app).await;
    let (status, body) = post(
        &app,
        "/uim/execute",
        Some(&token),
        json!({"intent_uid": SEARCH, "parameters": {"property_type": "apartment"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_parameters");
}

#[tokio::test]
async fn test_pat_header_is_accepted() {
    let (app, _) = provider(true);
    let token = handshake(&app).await;
    let request = Request::post("/uim/execute")
        .header("uim-pat", token)
        .body(Body::from(
            json!({"intent_uid": DETAILS, "parameters": {"property_id": "999"}}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"property_details": {}}));
}
