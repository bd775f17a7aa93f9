//! Input normalization.
//!
//! Every rule in the table runs against the normalized text, never the raw
//! input, so the rules only need to know about lowercase ASCII-ish words
//! separated by single spaces:
//!
//! ```text
//! "Show me ALL the critical issues, please!"
//!   └─ lowercase + strip punctuation + collapse whitespace
//!      "show me all the critical issues please"
//!   └─ synonym expansion (critical -> urgent, issues -> tickets)
//!      "show me all the urgent tickets please"
//! ```
//!
//! Synonyms are data. Multi-word keys ("assigned to me") are matched greedily,
//! longest key first, so a phrase wins over any single word it starts with.

use crate::config::Config;
use crate::error::ValidationError;
use once_cell::sync::Lazy;

/// Built-in synonym table: (phrase, replacement).
static BUILTIN_SYNONYMS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        // priority
        ("critical", "urgent"),
        ("high", "urgent"),
        ("asap", "urgent"),
        ("normal", "medium"),
        // status
        ("resolved", "closed"),
        ("solved", "closed"),
        ("done", "closed"),
        ("finished", "closed"),
        ("unresolved", "open"),
        ("pending", "open"),
        ("not closed", "open"),
        // ownership
        ("mine", "my"),
        ("my own", "my"),
        ("assigned to me", "my"),
        ("for me", "my"),
        // nouns
        ("issues", "tickets"),
        ("results", "tickets"),
        ("requests", "tickets"),
        ("issue", "ticket"),
        ("result", "ticket"),
        ("request", "ticket"),
        ("client", "customer"),
        // time
        ("past", "last"),
        ("previous", "last"),
    ]
});

/// Table of phrase replacements applied to the token sequence.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    /// (key tokens, replacement tokens), longest key first.
    entries: Vec<(Vec<String>, Vec<String>)>,
}

impl SynonymTable {
    /// The built-in table only.
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_SYNONYMS.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    /// The built-in table with `config.synonyms` layered on top. A configured
    /// key replaces a built-in key of the same phrase.
    pub fn with_config(config: &Config) -> Self {
        let mut pairs: Vec<(String, String)> = BUILTIN_SYNONYMS
            .iter()
            .filter(|(k, _)| !config.synonyms.keys().any(|ck| tokenize(ck) == tokenize(k)))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pairs.extend(config.synonyms.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_pairs(pairs)
    }

    fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: Vec<(Vec<String>, Vec<String>)> = pairs
            .into_iter()
            .map(|(k, v)| (tokenize(&k), tokenize(&v)))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        // Stable: equal-length keys keep declaration order.
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        SynonymTable { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn longest_match(&self, tokens: &[String]) -> Option<(usize, &[String])> {
        self.entries
            .iter()
            .find(|(key, _)| tokens.len() >= key.len() && tokens[..key.len()] == key[..])
            .map(|(key, replacement)| (key.len(), replacement.as_slice()))
    }

    /// Replace every synonym in `tokens`, scanning left to right. Replacements
    /// are not expanded again.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match self.longest_match(&tokens[i..]) {
                Some((consumed, replacement)) => {
                    out.extend(replacement.iter().cloned());
                    i += consumed;
                }
                None => {
                    out.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
        out
    }
}

/// Normalized form of one query: lowercase tokens and their space-joined text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    tokens: Vec<String>,
    text: String,
}

impl NormalizedQuery {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Normalize `raw`, rejecting input longer than `config.max_input_len`.
    pub fn parse(raw: &str, config: &Config, synonyms: &SynonymTable) -> Result<Self, ValidationError> {
        let len = raw.chars().count();
        if len > config.max_input_len {
            return Err(ValidationError::InputTooLong { len, max: config.max_input_len });
        }
        let tokens = synonyms.expand(&tokenize(raw));
        let text = tokens.join(" ");
        Ok(NormalizedQuery { tokens, text })
    }
}

/// Lowercase, drop apostrophes, turn every other non-alphanumeric character
/// into a separator and split.
fn tokenize(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}
