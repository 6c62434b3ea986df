//! Keyword classification of normalized text.
//!
//! A classifier is an ordered list of rules. Rules are evaluated in order and
//! the first match decides the category; text matching no rule falls back to
//! [`Category::Default`].
//!
//! The default rules are:
//!
//! 1. whole word `antyodaya` (case-insensitive) → [`Category::Aay`]
//! 2. substring `non` → [`Category::Apl`]
//! 3. substring `priority household` → [`Category::Bpl`]
//!
//! Rule 2 matches `non` anywhere, including inside unrelated words.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::preview;
use crate::model::Category;

/// Characters of normalized text included in debug logs.
pub const PREVIEW_CHARS: usize = 2000;

/// How a rule looks for its keyword.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Word-boundary match, case-insensitive.
    WholeWord(Regex),
    /// Plain substring match.
    Substring(String),
}

impl Matcher {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::WholeWord(re) => re.is_match(text),
            Matcher::Substring(needle) => text.contains(needle.as_str()),
        }
    }
}

/// A single `(predicate, category)` pair.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    matcher: Matcher,
    category: Category,
}

impl Rule {
    /// Match `word` as a whole word in any casing.
    pub fn whole_word(word: &str, category: Category) -> Result<Self> {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
        let re = Regex::new(&pattern).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self {
            name: word.to_string(),
            matcher: Matcher::WholeWord(re),
            category,
        })
    }

    /// Match `needle` anywhere in the text.
    pub fn substring(needle: &str, category: Category) -> Self {
        Self {
            name: needle.to_string(),
            matcher: Matcher::Substring(needle.to_string()),
            category,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Outcome of a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Name of the rule that matched, `None` for the fallback.
    pub rule: Option<String>,
}

/// Ordered, first-match-wins keyword classifier.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<Rule>,
    fallback: Category,
}

impl CategoryClassifier {
    /// Build a classifier from an explicit rule list.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            fallback: Category::Default,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify normalized text.
    pub fn classify(&self, text: &str) -> Category {
        self.evaluate(text).category
    }

    /// Classify normalized text and report which rule decided it.
    pub fn evaluate(&self, text: &str) -> Classification {
        log::debug!("Extracted text: {}", preview(text, PREVIEW_CHARS));

        match self.rules.iter().find(|rule| rule.matches(text)) {
            Some(rule) => {
                log::info!(
                    "{} detected due to '{}' keyword presence",
                    rule.category,
                    rule.name
                );
                Classification {
                    category: rule.category,
                    rule: Some(rule.name.clone()),
                }
            }
            None => {
                log::warn!(
                    "No specific category detected, using {}",
                    self.fallback
                );
                Classification {
                    category: self.fallback,
                    rule: None,
                }
            }
        }
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::with_rules(vec![
            Rule::whole_word("antyodaya", Category::Aay).expect("escaped pattern"),
            Rule::substring("non", Category::Apl),
            Rule::substring("priority household", Category::Bpl),
        ])
    }
}
