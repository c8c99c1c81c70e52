use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uim_core::UimConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "uim", version, about = "UIM intent discovery and trust handshake")]
struct Cli {
    /// Configuration file (defaults to ./uim.yaml when present).
    #[arg(long, global = true, env = "UIM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl domains and ingest their manifests into the catalog.
    Crawl {
        /// Domains to crawl. Defaults to `crawler.domains` from the config.
        domains: Vec<String>,
    },

    /// Serve the discovery and search API.
    Serve {
        /// Override `discovery.listen_addr`.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Run a provider serving the sample real-estate intents.
    Provider {
        /// Override `provider.listen_addr`.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Provider key management.
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Act as an agent against one provider.
    Agent {
        /// Provider base URL.
        #[arg(long, default_value = "http://localhost:4000")]
        service_url: String,

        #[command(subcommand)]
        cmd: AgentCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a provider token-signing key pair.
    Generate {
        /// Directory to write `private.key` and `public.key` into.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    /// Show the provider's service info and intents.
    Discover,

    /// Fetch and display the provider's usage policy.
    Policy,

    /// Sign the policy and obtain an authorization token.
    Token,

    /// Obtain a token and execute an intent.
    Execute {
        intent_uid: String,

        /// Intent parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = UimConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Crawl { domains } => commands::crawl::run(&config, domains).await?,
        Command::Serve { listen } => commands::serve::run(config, listen).await?,
        Command::Provider { listen } => commands::provider::run(&config, listen).await?,
        Command::Keys {
            cmd: KeysCommand::Generate { output },
        } => commands::keys::generate(output)?,
        Command::Agent { service_url, cmd } => {
            commands::agent::run(&config, &service_url, cmd).await?
        }
    }

    Ok(())
}
