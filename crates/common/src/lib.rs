//! ContextForge Common Library
//!
//! Shared code for all ContextForge binaries including:
//! - Intent-aware context compression (classification, reranking,
//!   evidence selection, token budgeting)
//! - Retrieval and embedding abstractions
//! - Answer generation client
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod retrieval;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use models::{Chunk, IndexedChunk};
pub use retrieval::{Retriever, SearchHit};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
