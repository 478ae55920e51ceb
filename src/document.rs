//! Extracted article representation and the small text helpers shared by
//! the extractor, the search step and the evaluator.

use serde::{Deserialize, Serialize};

/// Number of leading body tokens used as a search query when there is no title.
pub const QUERY_TOKENS: usize = 15;

/// Title and body of one article, as produced by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Page title, empty when unknown.
    pub title: String,
    /// Article text.
    pub body: String,
}

impl ExtractedDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Raw text given directly by the user.
    pub fn from_text(body: impl Into<String>) -> Self {
        Self::new("", body)
    }

    /// True when no article text could be obtained.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Cap the body to `max_chars` characters.
    pub fn capped(mut self, max_chars: usize) -> Self {
        self.body = truncate_chars(&self.body, max_chars).to_string();
        self
    }

    /// Search query for similar pages: the title, or the opening words of the body.
    pub fn derive_query(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        self.body
            .split_whitespace()
            .take(QUERY_TOKENS)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Approximate word count.
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse every whitespace run to a single space.
pub fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
