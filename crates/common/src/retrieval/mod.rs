//! Semantic retrieval contract
//!
//! The compression core only needs "given a query vector, return the K
//! nearest chunks with a distance". Index construction and storage live in
//! `contextforge-search`.

use crate::errors::Result;
use crate::models::Chunk;
use serde::{Deserialize, Serialize};

/// Retrieved chunk with its raw distance (lower = more similar)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub chunk: Chunk,

    /// Raw distance from the query vector, non-negative
    pub distance: f32,

    /// 1-indexed position in the retrieval order
    pub rank: usize,
}

/// Nearest-neighbour lookup over chunk embeddings.
///
/// Implementations must return hits ordered by ascending distance and cap
/// `k` at the number of indexed vectors. They are read-only after
/// construction, so one instance can serve concurrent queries.
pub trait Retriever: Send + Sync {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

impl<F> Retriever for F
where
    F: Fn(&[f32], usize) -> Result<Vec<SearchHit>> + Send + Sync,
{
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self(query, k)
    }
}
