//! Query pipeline - classify, embed, compress and optionally answer
//!
//! Produces the output dictionary consumed by the CLI and the gateway.

use super::citation::{Citation, CitationHandler};
use super::compressor::{CompressionResult, ContextCompressor};
use super::evidence::EvidenceItem;
use super::intent::{IntentClassifier, IntentResult, KeywordIntentClassifier};
use super::synthesizer::AnswerGenerator;
use crate::config::RetrievalConfig;
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::retrieval::Retriever;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Per-query knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub top_k: usize,
    pub token_limit: usize,
    pub generate_answer: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for QueryOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            token_limit: config.token_limit,
            generate_answer: false,
        }
    }
}

/// Everything the presentation layer needs about one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub intent: IntentResult,
    pub compressed_context: String,
    pub selected_evidence: Vec<EvidenceItem>,
    pub tokens_used: usize,
    pub num_sentences: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

/// Read-only after construction; share behind an `Arc` across requests
pub struct QueryPipeline {
    classifier: Arc<dyn IntentClassifier>,
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    compressor: ContextCompressor,
    generator: Option<Arc<dyn AnswerGenerator>>,
    citations: Option<Arc<dyn CitationHandler>>,
}

impl QueryPipeline {
    /// Pipeline with the keyword classifier and default rule tables
    pub fn new(embedder: Arc<dyn Embedder>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            classifier: Arc::new(KeywordIntentClassifier::default()),
            embedder,
            retriever,
            compressor: ContextCompressor::default(),
            generator: None,
            citations: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_compressor(mut self, compressor: ContextCompressor) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_citation_handler(mut self, handler: Arc<dyn CitationHandler>) -> Self {
        self.citations = Some(handler);
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn classify(&self, query: &str) -> IntentResult {
        self.classifier.classify(query)
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.retriever
    }

    pub fn generator(&self) -> Option<&Arc<dyn AnswerGenerator>> {
        self.generator.as_ref()
    }

    /// Run one query end to end
    #[instrument(skip(self, options), fields(top_k = options.top_k, token_limit = options.token_limit))]
    pub async fn run(&self, query: &str, options: &QueryOptions) -> Result<QueryOutcome> {
        let start = Instant::now();

        let intent = self.classifier.classify(query);
        let embedding = self.embedder.embed(query).await?;
        let compression = self.compressor.compress(
            &embedding,
            &intent,
            self.retriever.as_ref(),
            options.top_k,
            options.token_limit,
        )?;

        let (answer, citations) = if options.generate_answer {
            self.answer(query, &compression).await?
        } else {
            (None, Vec::new())
        };

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_compression(
            elapsed,
            intent.intent.as_str(),
            compression.tokens_used,
            compression.num_sentences,
        );

        tracing::info!(
            intent = %intent.intent,
            confidence = intent.confidence,
            tokens_used = compression.tokens_used,
            sentences = compression.num_sentences,
            answered = answer.is_some(),
            elapsed_ms = (elapsed * 1000.0) as u64,
            "Query processed"
        );

        Ok(QueryOutcome {
            query: query.to_string(),
            intent,
            compressed_context: compression.compressed_context,
            selected_evidence: compression.selected_evidence,
            tokens_used: compression.tokens_used,
            num_sentences: compression.num_sentences,
            answer,
            citations,
        })
    }

    async fn answer(
        &self,
        query: &str,
        compression: &CompressionResult,
    ) -> Result<(Option<String>, Vec<Citation>)> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::configuration("Answer generation requested but no generator is configured")
        })?;

        if let Some(handler) = &self.citations {
            if !handler.check_sufficiency(query, &compression.selected_evidence) {
                tracing::info!("Evidence judged insufficient, returning refusal");
                return Ok((Some(handler.generate_refusal(query)), Vec::new()));
            }
        }

        let answer = generator
            .generate(&compression.compressed_context, query)
            .await?;

        let citations = self
            .citations
            .as_ref()
            .map(|h| h.extract_citations(&answer, &compression.selected_evidence))
            .unwrap_or_default();

        Ok((Some(answer), citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::intent::Intent;
    use crate::embeddings::HashingEmbedder;
    use crate::models::Chunk;
    use crate::retrieval::SearchHit;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn hits() -> Vec<SearchHit> {
        vec![
            SearchHit {
                chunk: Chunk::new(0, 7, "Results", "Accuracy reached 91% on SQuAD. We are happy."),
                distance: 0.2,
                rank: 1,
            },
            SearchHit {
                chunk: Chunk::new(1, 2, "Introduction", "Retrieval helps."),
                distance: 0.3,
                rank: 2,
            },
        ]
    }

    fn pipeline() -> QueryPipeline {
        let retriever = |_: &[f32], k: usize| -> Result<Vec<SearchHit>> {
            Ok(hits().into_iter().take(k).collect())
        };
        QueryPipeline::new(Arc::new(HashingEmbedder::new(16)), Arc::new(retriever))
    }

    struct EchoGenerator {
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate(&self, context: &str, _query: &str) -> Result<String> {
            *self.seen.lock().unwrap() = Some(context.to_string());
            Ok("The model reached 91% [1].".to_string())
        }

        fn provider(&self) -> &str {
            "echo"
        }
    }

    struct StrictHandler {
        sufficient: bool,
    }

    impl CitationHandler for StrictHandler {
        fn extract_citations(&self, _answer: &str, evidence: &[EvidenceItem]) -> Vec<Citation> {
            evidence
                .iter()
                .take(1)
                .map(|e| Citation {
                    index: 1,
                    page: e.page,
                    section: e.section.clone(),
                    quote: e.sentence.clone(),
                })
                .collect()
        }

        fn check_sufficiency(&self, _query: &str, _evidence: &[EvidenceItem]) -> bool {
            self.sufficient
        }

        fn generate_refusal(&self, _query: &str) -> String {
            "I cannot answer from the provided papers.".to_string()
        }
    }

    #[tokio::test]
    async fn test_compress_without_answer() {
        let outcome = pipeline()
            .run("What accuracy and precision did the model achieve?", &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.intent.intent, Intent::Result);
        assert_eq!(outcome.compressed_context, "Accuracy reached 91% on SQuAD.");
        assert_eq!(outcome.num_sentences, 1);
        assert!(outcome.answer.is_none());
    }

    #[tokio::test]
    async fn test_answer_requested_without_generator() {
        let options = QueryOptions {
            generate_answer: true,
            ..QueryOptions::default()
        };
        let err = pipeline().run("What accuracy?", &options).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_generator_receives_compressed_context() {
        let generator = Arc::new(EchoGenerator {
            seen: Mutex::new(None),
        });
        let pipeline = pipeline()
            .with_generator(generator.clone())
            .with_citation_handler(Arc::new(StrictHandler { sufficient: true }));

        let options = QueryOptions {
            generate_answer: true,
            ..QueryOptions::default()
        };
        let outcome = pipeline.run("What accuracy and precision did the model achieve?", &options).await.unwrap();

        assert_eq!(outcome.answer.as_deref(), Some("The model reached 91% [1]."));
        assert_eq!(
            generator.seen.lock().unwrap().as_deref(),
            Some("Accuracy reached 91% on SQuAD.")
        );
        assert_eq!(outcome.citations.len(), 1);
        assert_eq!(outcome.citations[0].page, 7);
    }

    #[tokio::test]
    async fn test_insufficient_evidence_returns_refusal() {
        let generator = Arc::new(EchoGenerator {
            seen: Mutex::new(None),
        });
        let pipeline = pipeline()
            .with_generator(generator.clone())
            .with_citation_handler(Arc::new(StrictHandler { sufficient: false }));

        let options = QueryOptions {
            generate_answer: true,
            ..QueryOptions::default()
        };
        let outcome = pipeline.run("What accuracy?", &options).await.unwrap();

        assert_eq!(
            outcome.answer.as_deref(),
            Some("I cannot answer from the provided papers.")
        );
        assert!(generator.seen.lock().unwrap().is_none());
        assert!(outcome.citations.is_empty());
    }

    #[test]
    fn test_outcome_serialization_omits_missing_answer() {
        let outcome = QueryOutcome {
            query: "q".into(),
            intent: IntentResult::new(Intent::Definition, 0.3),
            compressed_context: String::new(),
            selected_evidence: Vec::new(),
            tokens_used: 0,
            num_sentences: 0,
            answer: None,
            citations: Vec::new(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("answer").is_none());
        assert!(json.get("citations").is_none());
        assert_eq!(json["intent"]["intent"], "DEFINITION");
        assert_eq!(json["intent"]["method"], "rule-based");
    }
}
