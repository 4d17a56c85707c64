//! Textly - terminal client for the Textly markdown workspace
//!
//! Main entry point: parses the CLI, loads configuration, and
//! dispatches to the command handlers.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use textly::cli::{Cli, Commands};
use textly::commands;
use textly::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load configuration and fold in the global CLI overrides.
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let mut config = Config::load(config_path)?;
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    if let Some(token) = &cli.token {
        config.server.token = Some(token.clone());
    }
    config.validate()?;

    match cli.command {
        Commands::Chat { resume, model } => {
            tracing::info!("Starting interactive chat session");
            commands::chat::run_chat(config, resume, model).await
        }
        Commands::Docs { command } => {
            tracing::debug!("Running docs command");
            commands::docs::run_docs(config, command).await
        }
        Commands::Models { command } => {
            tracing::debug!("Running models command");
            commands::models::run_models(config, command).await
        }
        Commands::Assist { command } => {
            tracing::debug!("Running assist command");
            commands::assist::run_assist(config, command).await
        }
        Commands::Auth { identity } => {
            tracing::info!("Starting authentication");
            commands::auth::run_auth(config, identity).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "textly=debug" } else { "textly=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
