//! Heuristic rule tables for chunk bonuses and sentence scores
//!
//! Each intent owns a list of rule groups. A group is an ordered list of
//! `(predicate, weight)` alternatives and contributes the weight of the
//! first alternative that holds. A text's score under an intent is the sum
//! of its groups' contributions, optionally clamped.

use super::intent::Intent;
use std::collections::HashMap;

/// Cap applied to chunk-level intent bonuses
pub const MAX_INTENT_BONUS: f32 = 0.3;

/// A test against a piece of text and its section label
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Lower-cased section contains the needle
    SectionContains(String),
    /// Lower-cased section equals one of the names
    SectionIsOneOf(Vec<String>),
    /// Text contains an ASCII digit
    ContainsDigit,
    /// Text contains the literal as-is
    Contains(String),
    /// Lower-cased text contains any of the keywords
    ContainsAnyLower(Vec<String>),
    /// At least `min` of the symbols occur in the text (each counted once)
    SymbolsAtLeast { symbols: Vec<String>, min: usize },
    /// Text starts with a numbered-list marker such as "2."
    StartsWithNumbered,
    /// Lower-cased text starts with the prefix
    StartsWithLower(String),
}

/// Text under evaluation, lower-cased once
#[derive(Debug)]
pub struct Target<'a> {
    text: &'a str,
    text_lower: String,
    section_lower: String,
}

impl<'a> Target<'a> {
    pub fn new(text: &'a str, section: &str) -> Self {
        Self {
            text,
            text_lower: text.to_lowercase(),
            section_lower: section.to_lowercase(),
        }
    }
}

impl Predicate {
    pub fn holds(&self, target: &Target<'_>) -> bool {
        match self {
            Predicate::SectionContains(needle) => target.section_lower.contains(needle.as_str()),
            Predicate::SectionIsOneOf(names) => names.iter().any(|n| *n == target.section_lower),
            Predicate::ContainsDigit => target.text.chars().any(|c| c.is_ascii_digit()),
            Predicate::Contains(literal) => target.text.contains(literal.as_str()),
            Predicate::ContainsAnyLower(keywords) => keywords
                .iter()
                .any(|k| target.text_lower.contains(k.as_str())),
            Predicate::SymbolsAtLeast { symbols, min } => {
                symbols.iter().filter(|s| target.text.contains(s.as_str())).count() >= *min
            }
            Predicate::StartsWithNumbered => {
                let digits = target.text.bytes().take_while(u8::is_ascii_digit).count();
                digits > 0 && target.text[digits..].starts_with('.')
            }
            Predicate::StartsWithLower(prefix) => target.text_lower.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predicate: Predicate,
    pub weight: f32,
}

/// Ordered alternatives; the first matching rule wins
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    alternatives: Vec<Rule>,
}

impl RuleGroup {
    pub fn single(predicate: Predicate, weight: f32) -> Self {
        Self::first_of(vec![(predicate, weight)])
    }

    pub fn first_of(alternatives: Vec<(Predicate, f32)>) -> Self {
        Self {
            alternatives: alternatives
                .into_iter()
                .map(|(predicate, weight)| Rule { predicate, weight })
                .collect(),
        }
    }

    pub fn contribution(&self, target: &Target<'_>) -> f32 {
        self.alternatives
            .iter()
            .find(|rule| rule.predicate.holds(target))
            .map_or(0.0, |rule| rule.weight)
    }
}

/// Mapping from intent to its rule groups
#[derive(Debug, Clone, Default)]
pub struct IntentRules {
    groups: HashMap<Intent, Vec<RuleGroup>>,
    cap: Option<f32>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn symbols_at_least(symbols: &[&str], min: usize) -> Predicate {
    Predicate::SymbolsAtLeast {
        symbols: words(symbols),
        min,
    }
}

impl IntentRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp every score to `[0, cap]`
    pub fn with_cap(mut self, cap: f32) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn with_groups(mut self, intent: Intent, groups: Vec<RuleGroup>) -> Self {
        self.groups.insert(intent, groups);
        self
    }

    pub fn groups(&self, intent: Intent) -> &[RuleGroup] {
        self.groups.get(&intent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Score a text under an intent; intents without rules score 0
    pub fn score(&self, intent: Intent, text: &str, section: &str) -> f32 {
        let target = Target::new(text, section);
        let total: f32 = self
            .groups(intent)
            .iter()
            .map(|group| group.contribution(&target))
            .sum();

        match self.cap {
            Some(cap) => total.clamp(0.0, cap),
            None => total,
        }
    }

    /// Chunk-level bonuses used by the reranker, capped at 0.3
    pub fn chunk_defaults() -> Self {
        use Predicate::*;

        Self::new()
            .with_cap(MAX_INTENT_BONUS)
            .with_groups(
                Intent::Result,
                vec![
                    RuleGroup::single(SectionContains("result".into()), 0.15),
                    RuleGroup::single(ContainsDigit, 0.1),
                    RuleGroup::single(Contains("%".into()), 0.05),
                ],
            )
            .with_groups(
                Intent::Method,
                vec![
                    RuleGroup::single(SectionContains("method".into()), 0.15),
                    RuleGroup::single(
                        ContainsAnyLower(words(&["algorithm", "pipeline", "step"])),
                        0.05,
                    ),
                ],
            )
            .with_groups(
                Intent::ApiUsage,
                vec![RuleGroup::first_of(vec![
                    (symbols_at_least(&["(", ")", "=", ":"], 3), 0.2),
                    (symbols_at_least(&["(", ")", "=", ":"], 2), 0.15),
                    (symbols_at_least(&["(", ")", "=", ":"], 1), 0.1),
                ])],
            )
            .with_groups(
                Intent::Definition,
                vec![RuleGroup::first_of(vec![
                    (SectionIsOneOf(words(&["abstract", "introduction"])), 0.2),
                    (SectionContains("intro".into()), 0.15),
                ])],
            )
            .with_groups(
                Intent::Comparison,
                vec![RuleGroup::single(
                    ContainsAnyLower(words(&[
                        "compare",
                        "comparison",
                        "difference",
                        "versus",
                        "vs",
                    ])),
                    0.15,
                )],
            )
    }

    /// Sentence-level scores used by the evidence selector, uncapped
    pub fn sentence_defaults() -> Self {
        use Predicate::*;

        Self::new()
            .with_groups(
                Intent::Result,
                vec![
                    RuleGroup::single(ContainsDigit, 0.2),
                    RuleGroup::single(Contains("%".into()), 0.15),
                    RuleGroup::single(
                        ContainsAnyLower(words(&["accuracy", "f1", "precision", "recall"])),
                        0.2,
                    ),
                ],
            )
            .with_groups(
                Intent::Method,
                vec![
                    RuleGroup::single(
                        ContainsAnyLower(words(&["step", "algorithm", "pipeline", "architecture"])),
                        0.2,
                    ),
                    RuleGroup::first_of(vec![
                        (StartsWithNumbered, 0.15),
                        (StartsWithLower("first,".into()), 0.15),
                    ]),
                ],
            )
            .with_groups(
                Intent::ApiUsage,
                vec![
                    RuleGroup::first_of(vec![
                        (symbols_at_least(&["(", ")", "="], 2), 0.25),
                        (symbols_at_least(&["(", ")", "="], 1), 0.15),
                    ]),
                    RuleGroup::single(
                        ContainsAnyLower(words(&["parameter", "argument", "return"])),
                        0.15,
                    ),
                ],
            )
            .with_groups(
                Intent::Definition,
                vec![RuleGroup::single(
                    ContainsAnyLower(words(&["is defined as", "refers to", "means"])),
                    0.3,
                )],
            )
            .with_groups(
                Intent::Comparison,
                vec![RuleGroup::single(
                    ContainsAnyLower(words(&["compare", "difference", "versus", "better", "worse"])),
                    0.2,
                )],
            )
    }
}
