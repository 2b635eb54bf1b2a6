//! Citation handling extension point
//!
//! No built-in strategy ships; the query pipeline consults a handler only
//! when one is supplied.

use super::evidence::EvidenceItem;
use serde::{Deserialize, Serialize};

/// Citation attached to a generated answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Citation index (1-based)
    pub index: usize,

    pub page: u32,

    pub section: String,

    /// Quoted/referenced text
    pub quote: String,
}

/// Grounding checks around answer generation
pub trait CitationHandler: Send + Sync {
    /// Map an answer back to the evidence it relies on
    fn extract_citations(&self, answer: &str, evidence: &[EvidenceItem]) -> Vec<Citation>;

    /// Whether the evidence is enough to attempt an answer
    fn check_sufficiency(&self, query: &str, evidence: &[EvidenceItem]) -> bool;

    /// Text returned instead of an answer when evidence is insufficient
    fn generate_refusal(&self, query: &str) -> String;
}
