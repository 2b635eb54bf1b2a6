//! Flat vector index with exact squared-L2 search

use contextforge_common::embeddings::Embedder;
use contextforge_common::errors::{AppError, Result};
use contextforge_common::models::{Chunk, IndexedChunk};
use contextforge_common::retrieval::{Retriever, SearchHit};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// In-memory exhaustive index over chunk embeddings
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    model: String,
    chunks: Vec<Chunk>,
    /// Row-major, `chunks.len() * dimension`
    vectors: Vec<f32>,
}

/// On-disk layout
#[derive(Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    model: String,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Build an index; every embedding must share the first one's length
    pub fn build(entries: Vec<IndexedChunk>, model: impl Into<String>) -> Result<Self> {
        let dimension = entries
            .first()
            .map(|e| e.embedding.len())
            .ok_or_else(|| AppError::EmptyIndex {
                message: "cannot build an index from zero chunks".to_string(),
            })?;

        if dimension == 0 {
            return Err(AppError::InvalidFormat {
                message: "embeddings must not be empty".to_string(),
            });
        }

        let mut chunks = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len() * dimension);

        for entry in entries {
            if entry.embedding.len() != dimension {
                return Err(AppError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.embedding.len(),
                });
            }
            vectors.extend_from_slice(&entry.embedding);
            chunks.push(entry.chunk);
        }

        let model = model.into();
        tracing::info!(chunks = chunks.len(), dimension, model = %model, "Built vector index");

        Ok(Self {
            dimension,
            model,
            chunks,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embedding model the vectors were produced with
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Reject an embedder whose vectors cannot be searched against this index.
    ///
    /// A different model name with a matching dimension is only logged.
    pub fn ensure_compatible(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.dimension() != self.dimension {
            return Err(AppError::configuration(format!(
                "embedder {} produces {} dimensions but the index holds {}",
                embedder.model_name(),
                embedder.dimension(),
                self.dimension
            )));
        }
        if embedder.model_name() != self.model {
            tracing::warn!(
                index_model = %self.model,
                embedder_model = embedder.model_name(),
                "Index was built with a different embedding model"
            );
        }
        Ok(())
    }

    fn vector(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dimension..(i + 1) * self.dimension]
    }

    /// K nearest chunks by squared L2 distance, ascending; ties keep insertion order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Err(AppError::EmptyIndex {
                message: "index has no vectors".to_string(),
            });
        }
        if query.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|i| (i, squared_l2(self.vector(i), query)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k.min(self.len()));

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (i, distance))| SearchHit {
                chunk: self.chunks[i].clone(),
                distance,
                rank: rank + 1,
            })
            .collect())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = IndexFile {
            dimension: self.dimension,
            model: self.model.clone(),
            chunks: self
                .chunks
                .iter()
                .enumerate()
                .map(|(i, chunk)| IndexedChunk {
                    chunk: chunk.clone(),
                    embedding: self.vector(i).to_vec(),
                })
                .collect(),
        };

        std::fs::write(path, serde_json::to_vec(&file)?)?;
        tracing::info!(path = %path.display(), chunks = self.len(), "Saved vector index");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AppError::Internal {
            message: format!("Failed to read index {}: {}", path.display(), e),
        })?;
        let file: IndexFile = serde_json::from_slice(&bytes)?;

        let index = Self::build(file.chunks, file.model)?;
        if index.dimension != file.dimension {
            return Err(AppError::DimensionMismatch {
                expected: file.dimension,
                actual: index.dimension,
            });
        }
        Ok(index)
    }
}

impl Retriever for VectorIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        VectorIndex::search(self, query, k)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
