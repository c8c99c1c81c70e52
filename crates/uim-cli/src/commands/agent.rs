//! `uim agent` - discovery, policy, token and execution from the agent side.

use crate::AgentCommand;
use anyhow::Context;
use serde_json::Value;
use uim_agent::Agent;
use uim_core::UimConfig;

pub async fn run(config: &UimConfig, service_url: &str, cmd: AgentCommand) -> anyhow::Result<()> {
    let agent = Agent::new(config.agent.clone());
    let client = agent.client(service_url)?;

    match cmd {
        AgentCommand::Discover => {
            let digest = agent.discover(&client).await?;
            println!("{digest}");
        }
        AgentCommand::Policy => {
            let manifest = client.fetch_manifest().await?;
            let policy = client.fetch_policy(manifest.policy_url.as_deref()).await?;
            println!("{policy}");
        }
        AgentCommand::Token => {
            let session = agent.handshake(&client).await?;
            if let Some(grant) = session.grant() {
                println!("Token: {}", grant.token);
                println!("Valid until: {}", grant.valid_to);
            }
        }
        AgentCommand::Execute { intent_uid, params } => {
            let parameters: Value =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let session = agent.handshake(&client).await?;
            let output = agent
                .execute(&client, &session, &intent_uid, parameters)
                .await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
