//! HTTP client for one provider.

use crate::error::AgentError;
use crate::session::TokenGrant;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use uim_core::Manifest;
use uim_policy::{Policy, SignedPolicy};
use url::Url;

/// Talks to a provider's manifest, policy, token and execute endpoints.
/// Every request is bounded by the configured timeout and never retried.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self, AgentError> {
        let base_url = Url::parse(service_url.trim_end_matches('/'))
            .map_err(|e| AgentError::InvalidUrl(format!("{service_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uim-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, AgentError> {
        self.base_url
            .join(path)
            .map_err(|e| AgentError::InvalidUrl(format!("{path}: {e}")))
    }

    /// `GET /agents.json`.
    pub async fn fetch_manifest(&self) -> Result<Manifest, AgentError> {
        let url = self.url("/agents.json")?;
        self.send_json(&url, self.http.get(url.clone())).await
    }

    /// Fetch the policy document. A document without the required sections
    /// aborts the handshake.
    pub async fn fetch_policy(&self, policy_url: Option<&str>) -> Result<Policy, AgentError> {
        let url = match policy_url {
            Some(raw) => Url::parse(raw).map_err(|e| AgentError::InvalidUrl(format!("{raw}: {e}")))?,
            None => self.url("/uim-policy.json")?,
        };
        let value: Value = self.send_json(&url, self.http.get(url.clone())).await?;
        Ok(Policy::from_value(value)?)
    }

    /// `POST /pat/issue`.
    pub async fn request_token(
        &self,
        agent_id: &str,
        signed_policy: &SignedPolicy,
        agent_public_key: &str,
    ) -> Result<TokenGrant, AgentError> {
        let url = self.url("/pat/issue")?;
        let body = json!({
            "agent_id": agent_id,
            "signed_policy": signed_policy,
            "agent_public_key": agent_public_key,
        });
        self.send_json(&url, self.http.post(url.clone()).json(&body)).await
    }

    /// Invoke an intent with a bearer token.
    pub async fn execute(
        &self,
        endpoint: &str,
        token: &str,
        intent_uid: &str,
        parameters: Value,
    ) -> Result<Value, AgentError> {
        let url = Url::parse(endpoint)
            .or_else(|_| self.url(endpoint))
            .map_err(|_| AgentError::InvalidUrl(endpoint.to_string()))?;
        let body = json!({ "intent_uid": intent_uid, "parameters": parameters });
        let request = self.http.post(url.clone()).bearer_auth(token).json(&body);
        self.send_json(&url, request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<T, AgentError> {
        debug!(url = %url, "provider request");
        let response = self.bounded(url, request.send()).await??;
        let response = check_status(url, response).await?;
        let bytes = self.bounded(url, response.bytes()).await??;
        serde_json::from_slice(&bytes).map_err(|e| AgentError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn bounded<F: Future>(&self, url: &Url, future: F) -> Result<F::Output, AgentError> {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| AgentError::Timeout {
                operation: format!("request to {url}"),
                timeout_ms: self.timeout.as_millis() as u64,
            })
    }
}

/// Turn a non-success status into a rejection carrying the provider's
/// reason code.
async fn check_status(url: &Url, response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let reason = body.get("error").and_then(Value::as_str).map(str::to_string);
    let detail = body
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(AgentError::Rejected {
        url: url.to_string(),
        status: status.as_u16(),
        reason,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_joined_to_base() {
        let client = ProviderClient::new("http://localhost:4000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url("/agents.json").unwrap().as_str(),
            "http://localhost:4000/agents.json"
        );
        assert!(ProviderClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transient() {
        let client = ProviderClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.fetch_manifest().await.unwrap_err();
        assert!(err.is_transient());
    }
}
