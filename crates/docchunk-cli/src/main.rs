//! Docchunk CLI
//!
//! Turns a directory of PDFs into a manifest of retrievable chunks.

use anyhow::Result;
use clap::Parser;
use docchunk_core::error::exit_codes;
use docchunk_core::{Config, DocChunkError};

mod app;
mod commands;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<DocChunkError>()
                .map(DocChunkError::exit_code)
                .unwrap_or(exit_codes::GENERAL_ERROR)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)?;
    tracing::debug!("Loaded config from {:?}", config_path);

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args, config, cli.format).await,
        Commands::Caption(args) => commands::caption::run(args, config, cli.format).await,
        Commands::Stats(args) => commands::stats::run(args, cli.format).await,
    }
}
