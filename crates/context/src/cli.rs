use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "context",
    version,
    about = "Intent-aware context compression over a ContextForge index"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress retrieved context for a question
    Query(QueryArgs),
    /// Compare baseline top-k context against the compressed context
    Compare(QueryArgs),
    /// Classify a question's intent
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    pub question: String,

    /// Index file (defaults to retrieval.index_path)
    #[arg(long)]
    pub index: Option<PathBuf>,

    #[arg(long)]
    pub top_k: Option<usize>,

    #[arg(long)]
    pub token_limit: Option<usize>,

    /// Generate an answer from the context
    #[arg(long, default_value_t = false)]
    pub answer: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    pub question: String,
}
