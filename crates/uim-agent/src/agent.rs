//! Drives the handshake and intent calls against a provider.

use crate::client::ProviderClient;
use crate::digest::ManifestDigest;
use crate::error::AgentError;
use crate::keys::KeyStore;
use crate::session::HandshakeSession;
use serde_json::Value;
use tracing::info;
use uim_core::AgentConfig;

pub struct Agent {
    config: AgentConfig,
    keys: KeyStore,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let keys = KeyStore::new(config.key_dir.clone());
        Self { config, keys }
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// A client for `service_url` using the configured timeout.
    pub fn client(&self, service_url: &str) -> Result<ProviderClient, AgentError> {
        ProviderClient::new(service_url, self.config.timeout())
    }

    pub async fn discover(&self, client: &ProviderClient) -> Result<ManifestDigest, AgentError> {
        let manifest = client.fetch_manifest().await?;
        Ok(ManifestDigest::from_manifest(&manifest))
    }

    /// Run the handshake up to `TokenIssued`: fetch the manifest and policy,
    /// sign the policy with this provider's key and exchange it for a token.
    pub async fn handshake(&self, client: &ProviderClient) -> Result<HandshakeSession, AgentError> {
        let service_url = client.base_url().as_str();
        let mut session = HandshakeSession::new(service_url, &self.config.agent_id);

        let manifest = client.fetch_manifest().await?;
        let policy = client.fetch_policy(manifest.policy_url.as_deref()).await?;
        session.set_manifest(manifest);
        session.policy_fetched(policy);

        let key = self.keys.load_or_generate(service_url)?;
        let signed = session.sign(&key)?.clone();

        let grant = client
            .request_token(&self.config.agent_id, &signed, &key.public_key_b64url()?)
            .await?;
        info!(
            service_url,
            agent_id = %self.config.agent_id,
            valid_to = %grant.valid_to,
            "authorization token received"
        );
        session.token_issued(grant)?;
        Ok(session)
    }

    /// Execute an intent published in the session's manifest.
    pub async fn execute(
        &self,
        client: &ProviderClient,
        session: &HandshakeSession,
        intent_uid: &str,
        parameters: Value,
    ) -> Result<Value, AgentError> {
        let token = session.token().ok_or(AgentError::InvalidState {
            expected: "token_issued",
            actual: session.state().as_str(),
        })?;
        let manifest = session.manifest().ok_or(AgentError::InvalidState {
            expected: "token_issued",
            actual: session.state().as_str(),
        })?;
        let intent = manifest
            .find_intent(intent_uid)
            .ok_or_else(|| AgentError::UnknownIntent(intent_uid.to_string()))?;

        let endpoint = manifest.endpoint_for(intent);
        let endpoint = if endpoint.is_empty() {
            "/uim/execute".to_string()
        } else {
            endpoint
        };
        client.execute(&endpoint, token, intent_uid, parameters).await
    }
}
