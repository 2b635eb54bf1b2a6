//! Evidence Selector - sentence-level extraction from reranked chunks

use super::intent::{Intent, IntentResult};
use super::reranker::{RankedChunk, INTENT_CONFIDENCE_THRESHOLD};
use super::rules::IntentRules;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

/// One scored sentence carrying its parent chunk's provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub sentence: String,
    pub page: u32,
    pub section: String,
    pub score: f32,
}

/// Split text at `.`, `!` or `?` followed by whitespace and a capital letter.
///
/// Whitespace is Unicode whitespace, so NBSP and em-spaces from PDF text
/// count; the capital is ASCII `A-Z`. Abbreviations such as "e.g. The" are
/// split too; the heuristic is approximate.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut saw_space = false;
        while let Some(&(_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            saw_space = true;
            chars.next();
        }

        if let Some(&(j, next)) = chars.peek() {
            if saw_space && next.is_ascii_uppercase() {
                push_trimmed(&mut sentences, &text[start..i + c.len_utf8()]);
                start = j;
            }
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

/// Length-based score used when the intent is not confident
pub fn default_score(sentence: &str) -> f32 {
    sentence.chars().count() as f32 / 1000.0
}

#[derive(Debug, Clone)]
pub struct EvidenceSelector {
    rules: IntentRules,
}

impl Default for EvidenceSelector {
    fn default() -> Self {
        Self::new(IntentRules::sentence_defaults())
    }
}

impl EvidenceSelector {
    pub fn new(rules: IntentRules) -> Self {
        Self { rules }
    }

    /// Intent heuristics for a single sentence
    pub fn score_sentence(&self, sentence: &str, section: &str, intent: Intent) -> f32 {
        self.rules.score(intent, sentence, section)
    }

    /// Split, score and keep the best `limit` sentences across all chunks
    #[instrument(skip_all, fields(chunks = chunks.len(), limit))]
    pub fn select(
        &self,
        chunks: &[RankedChunk],
        intent: &IntentResult,
        limit: usize,
    ) -> Vec<EvidenceItem> {
        let confident = intent.is_confident(INTENT_CONFIDENCE_THRESHOLD);
        let mut evidence = Vec::new();

        for ranked in chunks {
            for sentence in split_into_sentences(&ranked.chunk.text) {
                let score = if confident {
                    self.score_sentence(&sentence, &ranked.chunk.section, intent.intent)
                } else {
                    default_score(&sentence)
                };

                if score > 0.0 {
                    evidence.push(EvidenceItem {
                        sentence,
                        page: ranked.chunk.page,
                        section: ranked.chunk.section.clone(),
                        score,
                    });
                }
            }
        }

        let scored = evidence.len();
        evidence.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        evidence.truncate(limit);

        tracing::debug!(scored, kept = evidence.len(), confident, "Selected evidence");
        evidence
    }
}

/// Select with the built-in sentence rules
pub fn select_evidence(
    chunks: &[RankedChunk],
    intent: &IntentResult,
    limit: usize,
) -> Vec<EvidenceItem> {
    EvidenceSelector::default().select(chunks, intent, limit)
}
