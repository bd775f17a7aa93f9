//! Customer and project name rules.
//!
//! Both capture an open-ended name from the tokens after the trigger word.
//! Leading articles are skipped. The name ends at the end of the query, a
//! numeric token, another rule's trigger phrase or a configured stop word; an
//! empty name means the rule does not fire at that position.

use super::TRIGGER_PHRASES;
use crate::engine::BucketMask;
use crate::{Category, Config, FilterFragment, Operator, Rule, TicketField, Value};

const LEADING_ARTICLES: &[&str] = &["the", "a", "an"];

fn ends_name(word: &str, config: &Config) -> bool {
    config.is_stop_word(word) || TRIGGER_PHRASES.contains(word) || word.bytes().all(|b| b.is_ascii_digit())
}

/// Leading tokens of `tail` that form a name.
pub(crate) fn name_span(tail: &[&str], config: &Config) -> Option<String> {
    let words: Vec<&str> = tail
        .iter()
        .copied()
        .skip_while(|w| LEADING_ARTICLES.contains(w))
        .take_while(|w| !ends_name(w, config))
        .collect();
    if words.is_empty() { None } else { Some(words.join(" ")) }
}

/// "for acme", "from acme", "for customer acme", "customer acme"
pub fn rule_customer() -> Rule {
    rule! {
        name: "customer <name>",
        category: Category::Customer,
        pattern: r"\b(?:for|from)(?:\s+customer)?\s+|\bcustomer\s+",
        optional_phrases: ["for", "from", "customer"],
        buckets: BucketMask::NAMEISH.bits(),
        prod: |m, env| -> Option<FilterFragment> {
            let name = name_span(&m.tail, env.config)?;
            Some(FilterFragment::fixed(TicketField::Customer, Operator::ILike, Value::Text(name)))
        }
    }
}

/// "project apollo"
pub fn rule_project() -> Rule {
    rule! {
        name: "project <name>",
        category: Category::Project,
        pattern: r"\bproject\s+",
        optional_phrases: ["project"],
        buckets: BucketMask::NAMEISH.bits(),
        prod: |m, env| -> Option<FilterFragment> {
            let name = name_span(&m.tail, env.config)?;
            Some(FilterFragment::fixed(TicketField::Project, Operator::ILike, Value::Text(name)))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_customer(), rule_project()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_stops_at_stop_words_and_numbers() {
        let config = Config::default();
        assert_eq!(name_span(&["acme", "corp", "today"], &config).as_deref(), Some("acme corp"));
        assert_eq!(name_span(&["acme", "10", "tickets"], &config).as_deref(), Some("acme"));
        assert_eq!(name_span(&["last", "week"], &config), None);
        assert_eq!(name_span(&[], &config), None);
    }

    #[test]
    fn span_stops_at_other_rules_phrases() {
        let config = Config::default();
        assert_eq!(name_span(&["acme", "low", "priority"], &config).as_deref(), Some("acme"));
        assert_eq!(name_span(&["euroblaze", "and", "my", "open", "ones"], &config).as_deref(), Some("euroblaze"));
        assert_eq!(name_span(&["acme", "all"], &config).as_deref(), Some("acme"));
        assert_eq!(name_span(&["acme", "medium"], &config).as_deref(), Some("acme"));
    }

    #[test]
    fn span_skips_leading_articles() {
        let config = Config::default();
        assert_eq!(name_span(&["the", "acme", "group"], &config).as_deref(), Some("acme group"));
        assert_eq!(name_span(&["the", "last", "7", "days"], &config), None);
        assert_eq!(name_span(&["the", "customer", "euroblaze"], &config), None);
        assert_eq!(name_span(&["the"], &config), None);
    }
}
