//! Budget Manager - greedy token budgeting over ranked evidence
//!
//! Consumes evidence in score order and stops at the first item that
//! would push the running total past the limit. Items after a blocking
//! item are never considered, even if they would fit.

use super::evidence::EvidenceItem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Approximate token counting
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Rough estimate: 1 token ~= 4 characters
#[derive(Debug, Clone, Copy, Default)]
pub struct CharApproxCounter;

impl TokenCounter for CharApproxCounter {
    fn count(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Prefix of the evidence that fits the budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSelection {
    pub selected: Vec<EvidenceItem>,
    pub tokens_used: usize,
    pub count: usize,
}

#[derive(Clone)]
pub struct BudgetManager {
    counter: Arc<dyn TokenCounter>,
}

impl Default for BudgetManager {
    fn default() -> Self {
        Self::new(Arc::new(CharApproxCounter))
    }
}

impl std::fmt::Debug for BudgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetManager").finish_non_exhaustive()
    }
}

impl BudgetManager {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Greedily accept items in order until one would exceed `token_limit`.
    ///
    /// A zero limit selects nothing, including items that would cost 0 tokens.
    pub fn apply(&self, evidence: Vec<EvidenceItem>, token_limit: usize) -> BudgetSelection {
        let offered = evidence.len();
        let mut selected = Vec::new();
        let mut tokens_used = 0usize;

        if token_limit == 0 {
            tracing::debug!(offered, "Zero token budget, nothing selected");
            return BudgetSelection {
                selected,
                tokens_used,
                count: 0,
            };
        }

        for item in evidence {
            let cost = self.counter.count(&item.sentence);
            if tokens_used + cost > token_limit {
                break;
            }
            tokens_used += cost;
            selected.push(item);
        }

        tracing::debug!(
            offered,
            selected = selected.len(),
            tokens_used,
            token_limit,
            "Applied token budget"
        );

        BudgetSelection {
            count: selected.len(),
            selected,
            tokens_used,
        }
    }
}

/// Apply a budget with the character approximation
pub fn apply_budget(evidence: Vec<EvidenceItem>, token_limit: usize) -> BudgetSelection {
    BudgetManager::default().apply(evidence, token_limit)
}
