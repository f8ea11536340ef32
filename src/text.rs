//! Text normalization shared by every extractor.
//!
//! All cleaning of raw node text goes through this module: zero-width stripping,
//! whitespace collapsing, the enumeration prefix rule list and exclusion-term
//! matching. Everything here is pure.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that render as nothing but defeat emptiness checks
const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Leading enumeration patterns, applied in order, each at most once
const PREFIX_PATTERNS: &[&str] = &[r"^\d+\.\s*", r"^\d+\)\s*", r"^\d+\s+", r"^\d+"];

static PREFIX_RULES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| PREFIX_PATTERNS.iter().map(|p| builtin_regex(p)).collect());

/// Compile a hardcoded pattern
#[allow(clippy::expect_used)]
pub(crate) fn builtin_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded regex is valid")
}

/// Remove zero-width characters
pub fn strip_zero_width(raw: &str) -> String {
    raw.chars().filter(|c| !ZERO_WIDTH.contains(c)).collect()
}

/// Collapse every whitespace run (line breaks included) to one space and trim
pub fn collapse_whitespace(raw: &str) -> String {
    strip_zero_width(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean one paragraph, keeping its internal line breaks
///
/// Horizontal whitespace collapses to a single space, each line is trimmed and
/// lines left empty are dropped.
pub fn clean_paragraph(raw: &str) -> String {
    strip_zero_width(raw)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip a leading enumeration such as `"1. "`, `"2) "`, `"3 "` or bare digits
pub fn strip_enumeration_prefix(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for rule in PREFIX_RULES.iter() {
        if let Some(m) = rule.find(&text) {
            text = text[m.end()..].to_string();
        }
    }
    text.trim().to_string()
}

/// Normalize the text of a list item, heading span leaf or table cell
pub fn normalize_item(raw: &str) -> String {
    strip_enumeration_prefix(&collapse_whitespace(raw))
}

/// Case-insensitive substring exclusion list
#[derive(Clone, Debug, Default)]
pub struct ExcludeTerms {
    terms: Vec<String>,
}

impl ExcludeTerms {
    /// Build from raw terms; blank terms are ignored
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// True if `text` contains any term
    pub fn matches(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.terms.iter().any(|t| lowered.contains(t.as_str()))
    }

    /// True if no terms are configured
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
