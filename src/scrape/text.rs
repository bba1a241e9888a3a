//! Helpers for post-processing extracted text

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static UNWANTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s\-.,!?;:()\[\]{}"']"#).expect("valid character class")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email pattern")
});

static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{3}-\d{3}-\d{4}\b",
        r"\(\d{3}\)\s*\d{3}-\d{4}\b",
        r"\b\d{3}\.\d{3}\.\d{4}\b",
        r"\b\d{10}\b",
        r"\+1\s*\d{3}\s*\d{3}\s*\d{4}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid phone pattern"))
    .collect()
});

/// Normalize whitespace and drop characters outside words, whitespace and
/// common punctuation
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    UNWANTED.replace_all(collapsed.trim(), "").into_owned()
}

/// Unique email addresses in `text`, sorted
pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unique phone numbers in `text` in the common North American formats, sorted
pub fn extract_phone_numbers(text: &str) -> Vec<String> {
    PHONE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text).map(|m| m.as_str().to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Contact details found in a page's text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contacts {
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
}

impl Contacts {
    pub fn from_text(text: &str) -> Self {
        Self {
            emails: extract_emails(text),
            phone_numbers: extract_phone_numbers(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phone_numbers.is_empty()
    }
}
