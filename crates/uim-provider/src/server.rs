//! Provider HTTP surface.

use crate::documents::{build_manifest, build_policy};
use crate::error::ProviderError;
use crate::gate::{ExecutionGate, extract_token};
use crate::issuer::{AuthorizationIssuer, PatRequest, PatResponse};
use crate::registry::IntentRegistry;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uim_core::{Manifest, ProviderConfig};
use uim_pat::{KeyPair, TokenIssuer};
use uim_policy::{Policy, encode_public_key};

/// Everything a running provider serves.
pub struct Provider {
    manifest: Manifest,
    policy: Arc<Policy>,
    issuer: AuthorizationIssuer,
    gate: ExecutionGate,
}

impl Provider {
    /// Assemble a provider. The issuer and the gate share `keypair`.
    pub fn new(
        config: &ProviderConfig,
        registry: IntentRegistry,
        keypair: KeyPair,
    ) -> Result<Self, ProviderError> {
        if registry.is_empty() {
            return Err(ProviderError::Internal("no intents registered".into()));
        }
        let ttl = config
            .token_ttl()
            .map_err(|e| ProviderError::Internal(e.to_string()))?;

        let registry = Arc::new(registry);
        let policy = Arc::new(build_policy(&registry)?);
        let public_key = encode_public_key(&keypair.public_key_bytes())
            .map_err(|e| ProviderError::Internal(e.to_string()))?;
        let manifest = build_manifest(config, &registry, Some(public_key));

        let tokens = TokenIssuer::new(keypair);
        let gate = ExecutionGate::new(tokens.verifier(), policy.clone(), registry.clone());
        let issuer = AuthorizationIssuer::new(
            tokens,
            policy.clone(),
            registry,
            ttl,
            config.policy_scoped_tokens,
        );

        Ok(Self {
            manifest,
            policy,
            issuer,
            gate,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/agents.json", get(manifest))
            .route("/uim-policy.json", get(policy))
            .route("/pat/issue", post(issue_pat))
            .route("/uim/execute", post(execute))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self))
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self, addr: &str) -> Result<(), ProviderError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ProviderError::Internal(format!("bind {addr}: {e}")))?;
        tracing::info!(
            address = %addr,
            service = %self.manifest.service_info.name,
            intents = self.manifest.intents.len(),
            "UIM provider listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ProviderError::Internal(e.to_string()))
    }
}

pub(crate) async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

type ProviderState = State<Arc<Provider>>;

async fn manifest(State(provider): ProviderState) -> Json<Manifest> {
    Json(provider.manifest.clone())
}

async fn policy(State(provider): ProviderState) -> Json<Policy> {
    Json(provider.policy.as_ref().clone())
}

async fn issue_pat(
    State(provider): ProviderState,
    body: Bytes,
) -> Result<Json<PatResponse>, ProviderError> {
    let request = PatRequest::from_slice(&body)?;
    let issued = provider.issuer.issue(&request)?;
    Ok(Json(PatResponse::from(&issued)))
}

async fn execute(
    State(provider): ProviderState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ProviderError> {
    let output = provider.gate.execute(extract_token(&headers), &body).await?;
    Ok(Json(output))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
