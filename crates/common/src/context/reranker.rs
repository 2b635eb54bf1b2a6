//! Intent-Biased Reranker
//!
//! Over-fetches candidates from the retriever, adds an intent-specific
//! bonus to each candidate's similarity and keeps the best `k`.

use super::intent::IntentResult;
use super::rules::IntentRules;
use crate::errors::Result;
use crate::models::Chunk;
use crate::retrieval::{Retriever, SearchHit};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

/// Bonuses only apply above this confidence (strictly greater)
pub const INTENT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Candidates requested per kept chunk
pub const OVERFETCH_FACTOR: usize = 2;

/// Retrieved chunk with its combined score and final position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,

    /// Negated raw distance, higher is better
    pub similarity_score: f32,

    /// Intent bonus in [0, 0.3]
    pub intent_bonus: f32,

    /// `similarity_score + intent_bonus`
    pub final_score: f32,

    /// 1-indexed position after sorting by `final_score`
    pub rank: usize,
}

#[derive(Debug, Clone)]
pub struct IntentReranker {
    rules: IntentRules,
}

impl Default for IntentReranker {
    fn default() -> Self {
        Self::new(IntentRules::chunk_defaults())
    }
}

impl IntentReranker {
    pub fn new(rules: IntentRules) -> Self {
        Self { rules }
    }

    /// Bonus for one chunk; zero unless the intent is confident
    pub fn intent_bonus(&self, chunk: &Chunk, intent: &IntentResult) -> f32 {
        if !intent.is_confident(INTENT_CONFIDENCE_THRESHOLD) {
            return 0.0;
        }
        self.rules.score(intent.intent, &chunk.text, &chunk.section)
    }

    /// Retrieve `2k` candidates and return the top `k` by biased score
    #[instrument(skip_all, fields(intent = %intent.intent, k))]
    pub fn rerank(
        &self,
        query_embedding: &[f32],
        intent: &IntentResult,
        retriever: &dyn Retriever,
        k: usize,
    ) -> Result<Vec<RankedChunk>> {
        let candidates = retriever.search(query_embedding, k.saturating_mul(OVERFETCH_FACTOR))?;
        let fetched = candidates.len();

        let ranked = self.rank_hits(candidates, intent, k);

        tracing::debug!(
            fetched,
            kept = ranked.len(),
            confident = intent.is_confident(INTENT_CONFIDENCE_THRESHOLD),
            "Reranked candidates"
        );

        Ok(ranked)
    }

    /// Score, sort and truncate already retrieved hits
    pub fn rank_hits(&self, hits: Vec<SearchHit>, intent: &IntentResult, k: usize) -> Vec<RankedChunk> {
        let mut ranked: Vec<RankedChunk> = hits
            .into_iter()
            .map(|hit| {
                let similarity_score = -hit.distance;
                let intent_bonus = self.intent_bonus(&hit.chunk, intent);
                RankedChunk {
                    chunk: hit.chunk,
                    similarity_score,
                    intent_bonus,
                    final_score: similarity_score + intent_bonus,
                    rank: 0,
                }
            })
            .collect();

        // Stable: equal scores keep retrieval order
        ranked.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(k);

        for (i, chunk) in ranked.iter_mut().enumerate() {
            chunk.rank = i + 1;
        }
        ranked
    }
}

/// Rerank with the built-in bonus table
pub fn rerank(
    query_embedding: &[f32],
    intent: &IntentResult,
    retriever: &dyn Retriever,
    k: usize,
) -> Result<Vec<RankedChunk>> {
    IntentReranker::default().rerank(query_embedding, intent, retriever, k)
}
