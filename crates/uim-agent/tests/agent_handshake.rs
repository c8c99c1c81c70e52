//! Agent against a real provider on a loopback port.

use serde_json::json;
use tokio::net::TcpListener;
use uim_agent::{Agent, AgentError, HandshakeState};
use uim_core::{AgentConfig, ProviderConfig};
use uim_pat::KeyPair;
use uim_provider::{IntentRegistry, Provider, demo};

async fn start_provider() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let config = ProviderConfig {
        base_url: base_url.clone(),
        service_name: "fakerealestate.com".into(),
        ..Default::default()
    };
    let mut registry = IntentRegistry::new(&config.base_url);
    demo::register(&mut registry, &config.service_name);
    let provider = Provider::new(&config, registry, KeyPair::generate().unwrap()).unwrap();

    tokio::spawn(async move {
        axum::serve(listener, provider.router()).await.unwrap();
    });
    base_url
}

fn agent(key_dir: &std::path::Path) -> Agent {
    Agent::new(AgentConfig {
        key_dir: key_dir.to_path_buf(),
        timeout_ms: 5_000,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_discover_handshake_execute() {
    let base_url = start_provider().await;
    let keys = tempfile::tempdir().unwrap();
    let agent = agent(keys.path());
    let client = agent.client(&base_url).unwrap();

    let digest = agent.discover(&client).await.unwrap();
    assert_eq!(digest.service_name, "fakerealestate.com");
    assert_eq!(digest.intents.len(), 2);

    let session = agent.handshake(&client).await.unwrap();
    assert_eq!(session.state(), HandshakeState::TokenIssued);
    assert!(agent.keys().dir_for(&base_url).join("private_key.pem").exists());

    let out = agent
        .execute(
            &client,
            &session,
            "fakerealestate.com:getPropertyDetails:v1",
            json!({"property_id": "123"}),
        )
        .await
        .unwrap();
    assert_eq!(out["property_details"]["name"], "Luxury Apartment");
}

#[tokio::test]
async fn test_provider_rejections_carry_reason() {
    let base_url = start_provider().await;
    let keys = tempfile::tempdir().unwrap();
    let agent = agent(keys.path());
    let client = agent.client(&base_url).unwrap();
    let session = agent.handshake(&client).await.unwrap();

    let err = agent
        .execute(
            &client,
            &session,
            "fakerealestate.com:searchProperty:v1",
            json!({"min_price": 10}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.reason(), Some("invalid_parameters"));
    assert!(!err.is_transient());

    let err = client
        .execute(
            &format!("{base_url}/uim/execute"),
            "forged",
            "fakerealestate.com:searchProperty:v1",
            json!({"location": "New York"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Rejected { status: 401, .. }));

    let err = agent
        .execute(&client, &session, "fakerealestate.com:nothing:v1", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::UnknownIntent(_)));
}
