//! Intent Classifier - decides what kind of answer a query is after
//!
//! Provides:
//! - The five coarse query intents
//! - Rule-based keyword classification over an injectable table
//! - A `classify` capability that a model-backed classifier can implement later

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance tag reported by the keyword classifier
pub const RULE_BASED: &str = "rule-based";

/// Confidence reported when no keyword matches, and the floor for any match
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Coarse category describing what kind of answer a query seeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// How something works
    Method,
    /// Numbers, metrics, outcomes
    Result,
    /// How to call or configure an API
    ApiUsage,
    /// What something is
    Definition,
    /// How things differ
    Comparison,
}

impl Intent {
    /// All intents in classifier tie-break order
    pub const ALL: [Intent; 5] = [
        Intent::Result,
        Intent::Method,
        Intent::ApiUsage,
        Intent::Definition,
        Intent::Comparison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Method => "METHOD",
            Intent::Result => "RESULT",
            Intent::ApiUsage => "API_USAGE",
            Intent::Definition => "DEFINITION",
            Intent::Comparison => "COMPARISON",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome, created once per query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Which classifier produced this result
    pub method: String,
}

impl IntentResult {
    pub fn new(intent: Intent, confidence: f32) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            method: RULE_BASED.to_string(),
        }
    }

    /// Whether downstream stages should apply intent-specific heuristics
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

/// Anything that can map a query to an intent
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, query: &str) -> IntentResult;
}

/// Per-intent keyword lists, evaluated in insertion order
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(Intent, Vec<String>)>,
}

impl KeywordTable {
    /// Build a table; keywords are lower-cased and blanks dropped.
    ///
    /// Insertion order is the tie-break order between equally scored intents.
    pub fn new<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Intent, K)>,
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(intent, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|k| k.as_ref().trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (intent, keywords)
            })
            .collect();
        Self { entries }
    }

    pub fn keywords(&self, intent: Intent) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(i, _)| *i == intent)
            .map(|(_, k)| k.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intent, &[String])> {
        self.entries.iter().map(|(i, k)| (*i, k.as_slice()))
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new([
            (
                Intent::Result,
                vec![
                    "accuracy", "score", "result", "performance", "achieved", "percentage",
                    "metric", "evaluation", "benchmark", "improvement", "precision", "recall",
                    "f1", "error rate", "loss",
                ],
            ),
            (
                Intent::Method,
                vec![
                    "how does", "how do", "architecture", "approach", "algorithm", "pipeline",
                    "method", "technique", "process", "step", "procedure", "implementation",
                    "design", "mechanism", "work",
                ],
            ),
            (
                Intent::ApiUsage,
                vec![
                    "parameter", "argument", "return", "function", "example", "usage", "syntax",
                    "call", "invoke", "signature", "code", "how to use", "how to call",
                ],
            ),
            (
                Intent::Definition,
                vec![
                    "what is", "what are", "define", "definition", "meaning of", "explain",
                    "describe", "concept of", "term",
                ],
            ),
            (
                Intent::Comparison,
                vec![
                    "compare", "comparison", "difference", "versus", "vs", "better than",
                    "worse than", "similar to", "contrast", "advantage", "disadvantage",
                ],
            ),
        ])
    }
}

/// Weighted keyword matching.
///
/// Each matched keyword adds its word count to its intent's raw score; the
/// raw score is divided by the list length. The best intent's confidence is
/// `min(2 * score, 1)`, plus 0.2 when two or more keywords matched.
#[derive(Debug, Clone, Default)]
pub struct KeywordIntentClassifier {
    table: KeywordTable,
}

impl KeywordIntentClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, query: &str) -> IntentResult {
        let query = query.to_lowercase();

        // (intent, normalized score, matched keyword count)
        let mut best: Option<(Intent, f32, usize)> = None;

        for (intent, keywords) in self.table.iter() {
            if keywords.is_empty() {
                continue;
            }

            let mut raw = 0usize;
            let mut matched = 0usize;
            for keyword in keywords {
                if query.contains(keyword.as_str()) {
                    raw += keyword.split_whitespace().count();
                    matched += 1;
                }
            }
            if matched == 0 {
                continue;
            }

            let score = raw as f32 / keywords.len() as f32;
            if best.map_or(true, |(_, top, _)| score > top) {
                best = Some((intent, score, matched));
            }
        }

        let Some((intent, score, matched)) = best else {
            tracing::debug!("No intent keywords matched, falling back to DEFINITION");
            return IntentResult::new(Intent::Definition, FALLBACK_CONFIDENCE);
        };

        let mut confidence = (score * 2.0).min(1.0);
        if matched >= 2 {
            confidence = (confidence + 0.2).min(1.0);
        }
        let confidence = confidence.max(FALLBACK_CONFIDENCE);

        tracing::debug!(%intent, confidence, matched, "Classified query intent");
        IntentResult::new(intent, confidence)
    }
}

/// Classify with the built-in keyword table
pub fn classify(query: &str) -> IntentResult {
    KeywordIntentClassifier::default().classify(query)
}
