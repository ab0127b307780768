//! Tally CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use model::{ModelCatalog, Registry};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};
pub use {chat::ChatCmd, enrich::EnrichCmd};

mod chat;
pub mod config;
mod enrich;

/// Tally CLI
#[derive(Debug, Parser)]
#[command(name = "tally", version, about)]
pub struct App {
    /// Path to the gateway config (defaults to ~/.config/tally/config.toml,
    /// then to provider keys in the environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (use -v, -vv, -vvv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the models the configured providers serve
    Models,

    /// Chat with the assistant
    Chat(ChatCmd),

    /// Suggest categories for transactions
    Categorize(EnrichCmd),

    /// Detect the merchants behind transactions
    Merchants(EnrichCmd),

    /// Write a config template to the default path
    Generate,
}

impl App {
    /// Initialize tracing subscriber based on verbosity
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directive = match self.verbose {
                0 => "warn",
                1 => "tally_model=debug,tally_runtime=debug",
                2 => "tally_model=trace,tally_runtime=trace",
                3 => "debug",
                _ => "trace",
            };
            EnvFilter::new(directive)
        });

        fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Run the selected command.
    pub async fn run(self) -> Result<()> {
        if let Command::Generate = self.command {
            return config::generate();
        }

        let gateway = config::load(self.config.as_deref())?;
        let registry = Registry::from_config(&gateway)?;
        match self.command {
            Command::Models => list_models(&registry),
            Command::Chat(chat) => chat.run(registry).await,
            Command::Categorize(cmd) => cmd.categorize(&registry).await,
            Command::Merchants(cmd) => cmd.detect_merchants(&registry).await,
            Command::Generate => Ok(()),
        }
    }
}

fn list_models(registry: &Registry) -> Result<()> {
    let catalog = ModelCatalog::new(registry);
    if catalog.is_empty() {
        let model = catalog.default_model();
        println!("no provider configured; default model is {model}");
        return Ok(());
    }

    let width = catalog
        .available()
        .iter()
        .map(|option| option.id.len())
        .max()
        .unwrap_or_default();
    for option in catalog.available() {
        println!(
            "{:<width$}  {:<10}  {}",
            option.id,
            option.provider.as_str(),
            option.name
        );
    }
    Ok(())
}
