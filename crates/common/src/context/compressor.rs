//! Compression Orchestrator
//!
//! rerank -> select evidence -> apply budget -> join. Any stage failure
//! propagates unchanged and no partial result is returned.

use super::budget::BudgetManager;
use super::evidence::{EvidenceItem, EvidenceSelector};
use super::intent::IntentResult;
use super::reranker::IntentReranker;
use crate::errors::Result;
use crate::retrieval::Retriever;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Evidence candidates considered per kept chunk
pub const EVIDENCE_PER_CHUNK: usize = 5;

/// Separator between selected sentences in the compressed context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Final compressed context handed to answer generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub compressed_context: String,
    pub selected_evidence: Vec<EvidenceItem>,
    pub tokens_used: usize,
    pub num_sentences: usize,
}

/// The three compression stages wired together
#[derive(Debug, Clone, Default)]
pub struct ContextCompressor {
    reranker: IntentReranker,
    selector: EvidenceSelector,
    budget: BudgetManager,
}

impl ContextCompressor {
    pub fn new(reranker: IntentReranker, selector: EvidenceSelector, budget: BudgetManager) -> Self {
        Self {
            reranker,
            selector,
            budget,
        }
    }

    #[instrument(skip_all, fields(intent = %intent.intent, top_k, token_limit))]
    pub fn compress(
        &self,
        query_embedding: &[f32],
        intent: &IntentResult,
        retriever: &dyn Retriever,
        top_k: usize,
        token_limit: usize,
    ) -> Result<CompressionResult> {
        let ranked = self
            .reranker
            .rerank(query_embedding, intent, retriever, top_k)?;

        let evidence = self
            .selector
            .select(&ranked, intent, top_k.saturating_mul(EVIDENCE_PER_CHUNK));

        let selection = self.budget.apply(evidence, token_limit);

        let compressed_context = selection
            .selected
            .iter()
            .map(|e| e.sentence.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Ok(CompressionResult {
            compressed_context,
            tokens_used: selection.tokens_used,
            num_sentences: selection.count,
            selected_evidence: selection.selected,
        })
    }
}

/// Compress with the built-in rule tables and character token counting
pub fn compress(
    query_embedding: &[f32],
    intent: &IntentResult,
    retriever: &dyn Retriever,
    top_k: usize,
    token_limit: usize,
) -> Result<CompressionResult> {
    ContextCompressor::default().compress(query_embedding, intent, retriever, top_k, token_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::intent::Intent;
    use crate::errors::AppError;
    use crate::models::Chunk;
    use crate::retrieval::SearchHit;
    use proptest::prelude::*;

    fn library() -> Vec<SearchHit> {
        vec![
            SearchHit {
                chunk: Chunk::new(0, 1, "Abstract", "We study retrieval. It matters."),
                distance: 0.05,
                rank: 1,
            },
            SearchHit {
                chunk: Chunk::new(
                    1,
                    6,
                    "Results",
                    "Accuracy reached 91% on SQuAD. Training took two days. Recall was 0.87.",
                ),
                distance: 0.3,
                rank: 2,
            },
            SearchHit {
                chunk: Chunk::new(2, 4, "Method", "First, we embed every chunk. Then we rank."),
                distance: 0.4,
                rank: 3,
            },
        ]
    }

    fn retriever(hits: Vec<SearchHit>) -> impl Fn(&[f32], usize) -> Result<Vec<SearchHit>> {
        move |_: &[f32], k: usize| Ok(hits.iter().take(k).cloned().collect())
    }

    #[test]
    fn test_result_query_keeps_numeric_sentences() {
        let intent = IntentResult::new(Intent::Result, 0.8);
        let result = compress(&[0.0], &intent, &retriever(library()), 2, 500).unwrap();

        assert_eq!(result.num_sentences, 2);
        assert_eq!(
            result.compressed_context,
            "Accuracy reached 91% on SQuAD.\n\nRecall was 0.87."
        );
        assert_eq!(result.selected_evidence[0].page, 6);
        // 30 chars -> 7 tokens, 16 chars -> 4 tokens
        assert_eq!(result.tokens_used, 11);
    }

    #[test]
    fn test_unbounded_top_k_keeps_every_chunk() {
        let intent = IntentResult::new(Intent::Result, 0.8);
        let result = compress(&[0.0], &intent, &retriever(library()), usize::MAX, 500).unwrap();

        assert_eq!(result.num_sentences, 2);
        assert!(result.compressed_context.starts_with("Accuracy reached 91%"));
    }

    #[test]
    fn test_zero_token_limit_is_empty() {
        let intent = IntentResult::new(Intent::Result, 0.8);
        let result = compress(&[0.0], &intent, &retriever(library()), 3, 0).unwrap();

        assert_eq!(result.num_sentences, 0);
        assert_eq!(result.tokens_used, 0);
        assert_eq!(result.compressed_context, "");
        assert!(result.selected_evidence.is_empty());
    }

    #[test]
    fn test_no_scoring_sentences_gives_empty_context() {
        let intent = IntentResult::new(Intent::Comparison, 0.9);
        let result = compress(&[0.0], &intent, &retriever(library()), 3, 500).unwrap();
        assert_eq!(result.compressed_context, "");
        assert_eq!(result.num_sentences, 0);
    }

    #[test]
    fn test_retriever_failure_propagates() {
        let empty = |_: &[f32], _: usize| -> Result<Vec<SearchHit>> {
            Err(AppError::EmptyIndex {
                message: "index has no vectors".into(),
            })
        };
        let intent = IntentResult::new(Intent::Result, 0.8);
        let err = compress(&[0.0], &intent, &empty, 3, 500).unwrap_err();
        assert!(matches!(err, AppError::EmptyIndex { .. }));
    }

    proptest! {
        #[test]
        fn prop_compression_is_idempotent(
            top_k in 1usize..5,
            token_limit in 0usize..200,
            confidence in 0.0f32..=1.0,
            intent in prop::sample::select(Intent::ALL.to_vec()),
        ) {
            let intent = IntentResult::new(intent, confidence);
            let source = retriever(library());
            let first = compress(&[0.0], &intent, &source, top_k, token_limit).unwrap();
            let second = compress(&[0.0], &intent, &source, top_k, token_limit).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert!(first.tokens_used <= token_limit);
            prop_assert_eq!(first.num_sentences, first.selected_evidence.len());
        }
    }
}
