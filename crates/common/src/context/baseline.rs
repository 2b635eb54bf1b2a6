//! Baseline RAG context for comparison runs
//!
//! The baseline forwards the top-k retrieved chunks verbatim, labelled
//! with their provenance, and is measured with the same token estimate
//! as the compressed context.

use super::budget::estimate_tokens;
use crate::errors::Result;
use crate::retrieval::{Retriever, SearchHit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineContext {
    pub context: String,
    pub tokens: usize,
    pub num_chunks: usize,
}

/// `[Chunk i] (Page p, Section s): text`, blank-line separated
pub fn format_baseline_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Chunk {}] (Page {}, Section {}): {}",
                i + 1,
                hit.chunk.page,
                hit.chunk.section,
                hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_baseline(
    query_embedding: &[f32],
    retriever: &dyn Retriever,
    top_k: usize,
) -> Result<BaselineContext> {
    let hits = retriever.search(query_embedding, top_k)?;
    let context = format_baseline_context(&hits);

    Ok(BaselineContext {
        tokens: estimate_tokens(&context),
        num_chunks: hits.len(),
        context,
    })
}

/// `1 - compressed / baseline`, or `None` when the baseline is empty
pub fn token_reduction_ratio(baseline_tokens: usize, compressed_tokens: usize) -> Option<f64> {
    if baseline_tokens == 0 {
        return None;
    }
    Some(1.0 - compressed_tokens as f64 / baseline_tokens as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    #[test]
    fn test_baseline_format() {
        let hits = vec![
            SearchHit {
                chunk: Chunk::new(4, 2, "Method", "We embed chunks."),
                distance: 0.1,
                rank: 1,
            },
            SearchHit {
                chunk: Chunk::new(9, 5, "Results", "Accuracy was 91%."),
                distance: 0.2,
                rank: 2,
            },
        ];
        assert_eq!(
            format_baseline_context(&hits),
            "[Chunk 1] (Page 2, Section Method): We embed chunks.\n\n\
             [Chunk 2] (Page 5, Section Results): Accuracy was 91%."
        );
    }

    #[test]
    fn test_build_baseline_counts_tokens() {
        let retriever = |_: &[f32], k: usize| -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                chunk: Chunk::new(0, 1, "Abstract", "x".repeat(63)),
                distance: 0.0,
                rank: 1,
            }]
            .into_iter()
            .take(k)
            .collect())
        };
        let baseline = build_baseline(&[0.0], &retriever, 3).unwrap();
        // 38 characters of label plus 63 of text
        assert_eq!(baseline.tokens, 25);
        assert_eq!(baseline.num_chunks, 1);
    }

    #[test]
    fn test_reduction_ratio() {
        assert_eq!(token_reduction_ratio(200, 50), Some(0.75));
        assert_eq!(token_reduction_ratio(100, 100), Some(0.0));
        assert_eq!(token_reduction_ratio(0, 10), None);
    }
}
