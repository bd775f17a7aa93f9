//! Translator configuration.
//!
//! Everything that is data rather than logic lives here: input bounds, limit
//! defaults, the priority code sets and extra synonyms. The defaults match the
//! helpdesk deployment the rules were written against; a TOML file can
//! override any subset of fields.
//!
//! ```toml
//! max_input_len = 300
//! default_limit = 25
//!
//! [priority]
//! high = ["3"]
//!
//! [synonyms]
//! blocker = "urgent"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Upper bound on any result limit, regardless of configuration.
pub const HARD_MAX_LIMIT: u32 = 100;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Priority codes on the backend that each spoken level maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityCodes {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl Default for PriorityCodes {
    fn default() -> Self {
        Self {
            high: vec!["2".to_string(), "3".to_string()],
            medium: vec!["1".to_string()],
            low: vec!["0".to_string()],
        }
    }
}

impl PriorityCodes {
    /// Name of the level whose code set equals `codes`, if any.
    pub fn label_for(&self, codes: &[String]) -> Option<&'static str> {
        if codes == self.high.as_slice() {
            Some("high")
        } else if codes == self.medium.as_slice() {
            Some("medium")
        } else if codes == self.low.as_slice() {
            Some("low")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum accepted input length, in characters.
    pub max_input_len: usize,

    /// Limit used when the query does not ask for one.
    pub default_limit: u32,

    /// Requested limits above this are clamped. Never above [`HARD_MAX_LIMIT`].
    pub max_limit: u32,

    pub priority: PriorityCodes,

    /// Extra synonyms, merged over the built-in table. Keys may be phrases.
    pub synonyms: BTreeMap<String, String>,

    /// Words that end a captured customer or project name.
    pub stop_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_input_len: 500,
            default_limit: 50,
            max_limit: HARD_MAX_LIMIT,
            priority: PriorityCodes::default(),
            synonyms: BTreeMap::new(),
            stop_words: [
                "today", "this", "last", "since", "project", "open", "closed", "urgent", "tickets", "ticket", "for",
                "from", "with", "and", "or", "in", "of", "the", "priority",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_len == 0 {
            return Err(ConfigError::Invalid("max_input_len must be positive".to_string()));
        }
        if self.max_limit == 0 || self.max_limit > HARD_MAX_LIMIT {
            return Err(ConfigError::Invalid(format!("max_limit must be within 1..={HARD_MAX_LIMIT}")));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!("default_limit must be within 1..={}", self.max_limit)));
        }
        for (level, codes) in
            [("high", &self.priority.high), ("medium", &self.priority.medium), ("low", &self.priority.low)]
        {
            if codes.is_empty() {
                return Err(ConfigError::Invalid(format!("priority.{level} must list at least one code")));
            }
        }
        Ok(())
    }

    pub(crate) fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w == word)
    }
}
