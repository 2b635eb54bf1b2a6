//! Section header detection
//!
//! Labels each page with the academic section it belongs to. A header is
//! looked for in the first lines of a page; pages without one inherit the
//! previous page's section.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Section assigned before any header is seen
pub const UNKNOWN_SECTION: &str = "Unknown";

/// Lines inspected at the top of each page
const HEADER_SCAN_LINES: usize = 10;

/// Raw page text as produced by an extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
    /// Explicit section label; skips detection for this page when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Page with its resolved section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionedPage {
    pub page: u32,
    pub section: String,
    pub text: String,
}

fn header_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Priority order: earlier patterns win on the same line
        [
            (r"(?i)\babstract\b", "Abstract"),
            (r"(?i)\bintroduction\b", "Introduction"),
            (r"(?i)\bmethodology\b", "Methodology"),
            (r"(?i)\bmethod\b", "Method"),
            (r"(?i)\bresults?\b", "Results"),
            (r"(?i)\bdiscussion\b", "Discussion"),
            (r"(?i)\bconclusion\b", "Conclusion"),
            (r"(?i)\breferences?\b", "References"),
            (r"(?i)\brelated\s+work\b", "Related Work"),
            (r"(?i)\bexperiments?\b", "Experiments"),
        ]
        .into_iter()
        .map(|(pattern, name)| {
            (
                Regex::new(pattern).expect("section header regex is valid"),
                name,
            )
        })
        .collect()
    })
}

/// Section named by the first header-like line near the top of `text`.
///
/// Header-like: at least 3 and under 50 characters after trimming.
pub fn detect_section_header(text: &str) -> Option<&'static str> {
    text.split('\n')
        .take(HEADER_SCAN_LINES)
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            (3..50).contains(&len)
        })
        .find_map(|line| {
            header_patterns()
                .iter()
                .find(|(pattern, _)| pattern.is_match(line))
                .map(|(_, name)| *name)
        })
}

/// Resolve every page's section, carrying the current one forward
pub fn detect_sections(pages: Vec<PageText>) -> Vec<SectionedPage> {
    let mut current = UNKNOWN_SECTION.to_string();

    pages
        .into_iter()
        .map(|page| {
            let explicit = page.section.filter(|s| !s.trim().is_empty());
            if let Some(section) = explicit {
                current = section;
            } else if let Some(detected) = detect_section_header(&page.text) {
                current = detected.to_string();
            }

            SectionedPage {
                page: page.page,
                section: current.clone(),
                text: page.text,
            }
        })
        .collect()
}
