//! Logica Daemon - translates between Portuguese and propositional logic
//!
//! Serves the translation API and provides a few maintenance commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logica_shared::HttpLlmClient;
use logicad::config::Config;
use logicad::{debug_llm, server};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "logicad")]
#[command(about = "Logica - Portuguese to propositional logic translation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to /etc/logica/config.toml, then /var/lib/logica/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },

    /// Send one prompt to the LLM and print the raw and normalized reply
    DebugLlm {
        /// Portuguese sentence to translate into a formula
        #[arg(long)]
        text: Option<String>,

        /// Formula to translate into Portuguese
        #[arg(long)]
        formula: Option<String>,

        /// Proposition meaning for --formula, as L=meaning (repeatable)
        #[arg(long = "prop")]
        propositions: Vec<String>,
    },

    /// Write a default config file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::load_explicit(p),
        None => Ok(Config::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            info!("[BOOT] Logica Daemon v{} starting...", env!("CARGO_PKG_VERSION"));
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }
            server::run(config).await
        }
        Commands::DebugLlm {
            text,
            formula,
            propositions,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let request = debug_llm::request_from_args(text, formula, &propositions)?;
            let llm = HttpLlmClient::new(config.llm).context("Failed to create LLM client")?;
            let report = debug_llm::probe(&llm, &request)
                .await
                .context("LLM call failed")?;
            debug_llm::print_report(&request, &report);
            Ok(())
        }
        Commands::InitConfig { path } => {
            Config::save_default(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
