//! Core document models shared across ingestion, indexing and compression

use serde::{Deserialize, Serialize};

/// A retrievable span of paper text with its page/section provenance.
///
/// Chunks are produced once by ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique, incrementally assigned identifier
    pub chunk_id: u64,

    /// 1-based page the text came from
    pub page: u32,

    /// Section label, e.g. "Method", "Results", "Unknown"
    pub section: String,

    /// Chunk text
    pub text: String,
}

impl Chunk {
    pub fn new(chunk_id: u64, page: u32, section: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chunk_id,
            page,
            section: section.into(),
            text: text.into(),
        }
    }
}

/// A chunk paired with its embedding, as stored in the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,

    pub embedding: Vec<f32>,
}
