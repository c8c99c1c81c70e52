//! `uim provider` - serve the sample intents behind the trust handshake.

use anyhow::Context;
use uim_core::{ProviderConfig, UimConfig};
use uim_pat::KeyPair;
use uim_provider::{IntentRegistry, Provider, demo};

pub async fn run(config: &UimConfig, listen: Option<String>) -> anyhow::Result<()> {
    let provider_config = &config.provider;
    let keypair = load_keypair(provider_config)?;

    let mut registry = IntentRegistry::new(&provider_config.base_url);
    demo::register(&mut registry, &provider_config.service_name);

    let addr = listen.unwrap_or_else(|| provider_config.listen_addr.clone());
    Provider::new(provider_config, registry, keypair)?
        .serve(&addr)
        .await?;
    Ok(())
}

/// The configured signing key, else a fresh one for this process.
fn load_keypair(config: &ProviderConfig) -> anyhow::Result<KeyPair> {
    match config.resolve_private_key().context("reading provider private key")? {
        Some(hex) => Ok(KeyPair::from_private_key_hex(&hex)?),
        None => {
            tracing::warn!(
                "no provider private key configured; generated an ephemeral key, \
                 tokens will not survive a restart"
            );
            Ok(KeyPair::generate()?)
        }
    }
}
