//! Trigger scanning (query pre-classification).
//!
//! Inspects the normalized query and produces coarse signals that let the
//! parser decide which rules are worth running:
//!
//! - **Buckets** (`BucketMask`): cheap booleans such as "contains digits" or
//!   "mentions a time word". Used to enable bucketed rules via
//!   `RuleIndex::by_bucket`.
//! - **Phrases** (`TriggerInfo::phrases`): the distinct tokens of the query.
//!   Used for phrase gating in `Parser::new`.
//!
//! This is a heuristic scan. False positives are fine because the parser still
//! has to match each rule's regex.

use super::compiled_rules::BucketMask;
use crate::NormalizedQuery;
use std::collections::HashSet;

const TIME_WORDS: &[&str] =
    &["today", "this", "last", "week", "weeks", "month", "months", "quarter", "year", "day", "days"];

const NAME_WORDS: &[&str] = &["for", "from", "customer", "project"];

/// Query characteristics used to gate rule activation.
#[derive(Debug, Clone)]
pub struct TriggerInfo {
    pub buckets: BucketMask,
    pub phrases: HashSet<String>,
}

impl TriggerInfo {
    pub fn scan(query: &NormalizedQuery) -> Self {
        let mut buckets = BucketMask::empty();
        let phrases: HashSet<String> = query.tokens().iter().cloned().collect();

        if query.text().bytes().any(|b| b.is_ascii_digit()) {
            buckets |= BucketMask::HAS_DIGITS;
        }
        if TIME_WORDS.iter().any(|w| phrases.contains(*w)) {
            buckets |= BucketMask::TIMEISH;
        }
        if NAME_WORDS.iter().any(|w| phrases.contains(*w)) {
            buckets |= BucketMask::NAMEISH;
        }

        TriggerInfo { buckets, phrases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, SynonymTable};

    fn scan(raw: &str) -> TriggerInfo {
        let query = NormalizedQuery::parse(raw, &Config::default(), &SynonymTable::builtin()).unwrap();
        TriggerInfo::scan(&query)
    }

    #[test]
    fn detects_buckets() {
        assert_eq!(scan("show my open tickets").buckets, BucketMask::empty());
        assert_eq!(scan("show 10 tickets").buckets, BucketMask::HAS_DIGITS);
        assert_eq!(scan("tickets for acme last 7 days").buckets, BucketMask::all());
    }

    #[test]
    fn phrases_are_normalized_tokens() {
        let info = scan("Critical issues!");
        assert!(info.phrases.contains("urgent"));
        assert!(info.phrases.contains("tickets"));
        assert!(!info.phrases.contains("critical"));
    }
}
