//! Text chunking module
//!
//! Splits page text into sentence-aligned chunks that keep their page and
//! section provenance.

use crate::sections::SectionedPage;
use contextforge_common::context::split_into_sentences;
use contextforge_common::models::Chunk;
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

/// Split one page of text into chunk texts.
///
/// Text within `chunk_size` stays whole. Longer text is split into
/// sentences that are grouped greedily; a single sentence longer than
/// `chunk_size` becomes its own chunk.
pub fn split_text_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.chars().count() <= chunk_size {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_into_sentences(trimmed) {
        let sentence_len = sentence.chars().count();
        // joining space counts toward the limit
        let joined_len = if current.is_empty() {
            sentence_len
        } else {
            current_len + 1 + sentence_len
        };

        if joined_len > chunk_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Chunk every page, assigning ids incrementally across the document
pub fn chunk_pages(pages: &[SectionedPage], config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut next_id = 0u64;

    for page in pages {
        for text in split_text_into_chunks(&page.text, config.chunk_size) {
            chunks.push(Chunk::new(next_id, page.page, page.section.clone(), text));
            next_id += 1;
        }
    }

    debug!(
        pages = pages.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Pages chunked"
    );

    chunks
}
