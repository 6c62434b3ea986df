//! Text normalization for keyword matching.

use std::sync::OnceLock;

use regex::Regex;

/// Normalizes extracted text into the form the classifier matches against.
///
/// Every character outside `[a-zA-Z0-9 ]` becomes a space, whitespace runs
/// collapse to a single space, the result is trimmed and lowercased.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    special_chars: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            special_chars: Regex::new(r"[^a-zA-Z0-9 ]").expect("static pattern"),
            whitespace: Regex::new(r"\s+").expect("static pattern"),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = self.special_chars.replace_all(text, " ");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().to_lowercase()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize text with a shared [`TextNormalizer`].
pub fn normalize_text(text: &str) -> String {
    static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();
    NORMALIZER.get_or_init(TextNormalizer::new).normalize(text)
}

/// At most `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
