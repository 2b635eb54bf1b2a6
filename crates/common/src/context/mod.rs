//! Context Engine Core Components
//!
//! The Context Engine turns a question and a semantic index into a small,
//! intent-relevant context:
//! - Intent classification
//! - Intent-biased reranking
//! - Sentence-level evidence selection
//! - Token budgeting and compression
//! - Answer generation and citation hooks

mod baseline;
mod budget;
mod citation;
mod compressor;
mod evidence;
mod intent;
mod pipeline;
mod reranker;
mod rules;
mod synthesizer;

pub use baseline::{build_baseline, format_baseline_context, token_reduction_ratio, BaselineContext};
pub use budget::{apply_budget, estimate_tokens, BudgetManager, BudgetSelection, CharApproxCounter, TokenCounter};
pub use citation::{Citation, CitationHandler};
pub use compressor::{compress, CompressionResult, ContextCompressor, CONTEXT_SEPARATOR, EVIDENCE_PER_CHUNK};
pub use evidence::{default_score, select_evidence, split_into_sentences, EvidenceItem, EvidenceSelector};
pub use intent::{
    classify, Intent, IntentClassifier, IntentResult, KeywordIntentClassifier, KeywordTable,
    FALLBACK_CONFIDENCE, RULE_BASED,
};
pub use pipeline::{QueryOptions, QueryOutcome, QueryPipeline};
pub use reranker::{rerank, IntentReranker, RankedChunk, INTENT_CONFIDENCE_THRESHOLD, OVERFETCH_FACTOR};
pub use rules::{IntentRules, Predicate, Rule, RuleGroup, Target, MAX_INTENT_BONUS};
pub use synthesizer::{build_prompt, AnswerGenerator, GenerationProvider, LlmAnswerGenerator};
