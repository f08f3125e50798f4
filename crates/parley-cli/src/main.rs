use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use parley_application::ConversationManager;
use parley_infrastructure::{ConfigService, HttpSyncGateway, default_credentials};

mod clipboard;
mod commands;
mod helper;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley - talk to remote AI personas from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/parley/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List personas you already have conversations with
    Chats,
    /// Open the conversation with a persona
    Chat {
        /// Persona name, as known to the server
        persona: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new_default(),
    };
    let config = config_service
        .load()
        .context("Failed to load configuration")?;
    tracing::debug!("[parley] Using server {}", config.api_url);

    let gateway = Arc::new(HttpSyncGateway::from_config(&config, default_credentials()));
    let manager = ConversationManager::new(gateway, config.policy);

    match cli.command {
        Commands::Chats => commands::chats::run(&manager).await?,
        Commands::Chat { persona } => commands::chat::run(&manager, &persona).await?,
    }

    Ok(())
}
