//! NutriRAG CLI
//!
//! Nutrition targets and clinical-guideline-grounded recommendations.

use anyhow::Result;
use clap::Parser;
use nutrirag_core::error::exit_codes;
use nutrirag_core::{Config, NutriRagError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries command output and MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<NutriRagError>()
            .map(NutriRagError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Targets(args) => commands::targets::run(args, &config, cli.format).await,
        Commands::Recommend(args) => commands::recommend::run(args, &config, cli.format).await,
        Commands::Budget(args) => commands::budget::run(args, &config, cli.format).await,
        Commands::Status => commands::status::run(&config, cli.format).await,
        Commands::Mcp => {
            let recommender = nutrirag_core::Recommender::from_config(&config)?;
            nutrirag_mcp::start_server(&recommender).await
        }
    }
}
