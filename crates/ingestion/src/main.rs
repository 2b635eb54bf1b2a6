//! ContextForge Ingestion CLI
//!
//! Reads a PDF, or extracted page text as a JSON array of
//! `{page, text, section?}`, then detects sections, chunks, embeds and
//! writes the vector index.

use anyhow::{Context, Result};
use clap::Parser;
use contextforge_common::{config::AppConfig, embeddings::create_embedder, metrics, VERSION};
use contextforge_ingestion::{ChunkingConfig, IngestionProcessor};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "ingestion",
    version,
    about = "Build a ContextForge vector index from a PDF or extracted page text"
)]
struct Cli {
    /// PDF paper, or JSON file of extracted pages
    input: PathBuf,

    /// Where to write the index (defaults to retrieval.index_path)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Target chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Embedding provider: hashing, openai
    #[arg(long)]
    embedding_provider: Option<String>,

    /// Print the ingestion report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = run().await {
        error!(error = %err, "ingestion failed");
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(chunk_size) = cli.chunk_size {
        config.ingestion.chunk_size = chunk_size;
    }
    if let Some(provider) = cli.embedding_provider {
        config.embedding.provider = provider;
    }
    config.validate()?;

    metrics::init_tracing(&config.observability);
    info!("Starting ContextForge Ingestion v{}", VERSION);

    let embedder = create_embedder(&config.embedding)?;
    let processor = IngestionProcessor::new(
        embedder,
        ChunkingConfig {
            chunk_size: config.ingestion.chunk_size,
        },
        config.embedding.batch_size,
    );

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.retrieval.index_path));
    let report = processor
        .ingest_file(&cli.input, &output)
        .await
        .with_context(|| format!("failed to ingest {}", cli.input.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Indexed {} chunks from {} pages ({} dims, {}) -> {} in {} ms",
            report.chunks,
            report.pages,
            report.dimension,
            report.model,
            report.output.display(),
            report.elapsed_ms
        );
    }
    Ok(())
}
