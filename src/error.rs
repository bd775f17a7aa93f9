//! Translator error types

use crate::Category;
use crate::adapter::BackendError;
use thiserror::Error;

/// Input rejected before or during resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Raw input exceeds the configured bound
    #[error("query is {len} characters long; the maximum is {max}")]
    InputTooLong { len: usize, max: usize },

    /// The query filters on "my" tickets but no caller identity was supplied
    #[error("query refers to the caller's tickets but no caller identity was provided")]
    MissingCaller,
}

/// Errors surfaced by translation and execution.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),

    /// Two rules of one category matched with different filters
    #[error("ambiguous query: {} conflict on the {category} filter", quote_terms(.terms))]
    Ambiguous { category: Category, terms: Vec<String> },

    /// Backend failure, passed through unmodified
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn quote_terms(terms: &[String]) -> String {
    match terms {
        [] => String::new(),
        [only] => format!("\"{only}\""),
        [head @ .., last] => {
            let head: Vec<String> = head.iter().map(|t| format!("\"{t}\"")).collect();
            format!("{} and \"{last}\"", head.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_message_names_every_term() {
        let err = QueryError::Ambiguous {
            category: Category::Status,
            terms: vec!["open".to_string(), "closed".to_string()],
        };
        assert_eq!(err.to_string(), "ambiguous query: \"open\" and \"closed\" conflict on the status filter");
    }

    #[test]
    fn validation_message_carries_bounds() {
        let err: QueryError = ValidationError::InputTooLong { len: 620, max: 500 }.into();
        assert_eq!(err.to_string(), "invalid query: query is 620 characters long; the maximum is 500");
    }
}
