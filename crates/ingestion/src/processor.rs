//! Ingestion processor
//!
//! Core logic for turning a paper into a searchable index: page
//! extraction, section detection, chunking, batched embedding and index build.

use crate::chunker::{chunk_pages, ChunkingConfig};
use crate::errors::IngestionError;
use crate::pdf::extract_pages;
use crate::sections::{detect_sections, PageText};
use contextforge_common::embeddings::Embedder;
use contextforge_common::models::{Chunk, IndexedChunk};
use contextforge_search::VectorIndex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Summary of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub model: String,
    pub output: PathBuf,
    pub elapsed_ms: u64,
}

pub struct IngestionProcessor {
    embedder: Arc<dyn Embedder>,
    chunking_config: ChunkingConfig,
    batch_size: usize,
}

impl IngestionProcessor {
    pub fn new(embedder: Arc<dyn Embedder>, chunking_config: ChunkingConfig, batch_size: usize) -> Self {
        Self {
            embedder,
            chunking_config,
            batch_size: batch_size.max(1),
        }
    }

    /// Read pages from a `.pdf` file or a JSON array of `{page, text, section?}`
    pub fn load_pages(path: &Path) -> Result<Vec<PageText>, IngestionError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            return extract_pages(path);
        }

        if !path.exists() {
            return Err(IngestionError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| IngestionError::InvalidInput {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Chunk the pages without embedding them
    pub fn chunk(&self, pages: Vec<PageText>) -> Vec<Chunk> {
        let pages = detect_sections(pages);
        chunk_pages(&pages, &self.chunking_config)
    }

    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn build_index(&self, pages: Vec<PageText>) -> Result<VectorIndex, IngestionError> {
        let chunks = self.chunk(pages);
        if chunks.is_empty() {
            return Err(IngestionError::NoChunks(
                "every page was empty".to_string(),
            ));
        }
        info!(chunk_count = chunks.len(), "Text chunked successfully");

        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(IngestionError::Pipeline(
                    contextforge_common::AppError::EmbeddingError {
                        message: format!(
                            "Expected {} embeddings, received {}",
                            batch.len(),
                            embeddings.len()
                        ),
                    },
                ));
            }

            entries.extend(batch.iter().cloned().zip(embeddings).map(|(chunk, embedding)| {
                IndexedChunk { chunk, embedding }
            }));
        }

        Ok(VectorIndex::build(entries, self.embedder.model_name())?)
    }

    /// Load pages, build the index and save it to `output`
    pub async fn ingest_file(&self, input: &Path, output: &Path) -> Result<IngestionReport, IngestionError> {
        let start = Instant::now();
        let pages = Self::load_pages(input)?;
        let page_count = pages.len();

        let index = self.build_index(pages).await?;
        index.save(output)?;

        let report = IngestionReport {
            pages: page_count,
            chunks: index.len(),
            dimension: index.dimension(),
            model: index.model().to_string(),
            output: output.to_path_buf(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            pages = report.pages,
            chunks = report.chunks,
            output = %output.display(),
            "Ingestion complete"
        );
        Ok(report)
    }
}
