//! ContextForge command line
//!
//! Runs the adaptive pipeline for a question, compares it with the
//! baseline top-k context, or classifies a question's intent.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use contextforge_common::{config::AppConfig, metrics, VERSION};
use tracing::{debug, error};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;
    metrics::init_tracing(&config.observability);
    debug!("ContextForge CLI v{}", VERSION);

    match cli.command {
        Commands::Query(args) => commands::query(&config, args).await,
        Commands::Compare(args) => commands::compare(&config, args).await,
        Commands::Classify(args) => commands::classify(args),
    }
}
