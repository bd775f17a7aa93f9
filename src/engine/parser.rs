//! Rule matching.
//!
//! - Select the rules that are plausible for the query (bucket + phrase
//!   gating; see `compiled_rules.rs` and `trigger.rs`).
//! - Run each active rule's regex over the normalized text, in evaluation
//!   order, and keep the first match whose production yields an outcome.
//! - Hand the hits to the resolver (`resolve.rs`).
//!
//! ## Key concepts
//!
//! - **Rule** (`crate::Rule`): a regex with a category and a production.
//! - **RuleMatch** (`crate::RuleMatch`): one regex hit, with its capture
//!   groups and the tokens that follow it.
//! - **RuleHit**: a rule that fired, with the outcome it produced.
//!
//! A rule fires at most once per query. Later matches of the same rule are not
//! looked at once an earlier one produced something, which is what makes
//! "10 tickets ... 20 tickets" pick 10.
//!
//! ```text
//! "show my open tickets for acme"
//!       ^^ my    -> assignee = <caller>
//!          ^^^^ open -> close_date = empty
//!                       ^^^^ customer <name> -> partner_id.name ilike 'acme'
//! ```
//!
//! ## Debugging
//!
//! `RUST_LOG=helpdesk_query=debug` logs the trigger scan, the active rules and
//! every hit; `trace` adds matches whose production declined.

use super::compiled_rules::CompiledRules;
use super::metrics::{RunMetrics, RunResult};
use super::resolve::resolve_hits;
use super::trigger::TriggerInfo;
use crate::{
    Category, Config, Context, FragmentValue, NormalizedQuery, Outcome, QueryError, QuerySpec, Range, Rule, RuleEnv,
    RuleMatch, Value,
};
use std::time::Instant;
use tracing::{debug, trace};

/// A rule that fired on the query.
#[derive(Debug, Clone)]
pub struct RuleHit {
    pub rule: &'static str,
    pub category: Category,
    /// The words that triggered the rule, as they appear in the normalized text.
    pub term: String,
    pub range: Range,
    pub outcome: Outcome,
}

/// Parser applies `Rule`s to one normalized query.
///
/// Usage: create with `Parser::new(&query, &rules)` then call
/// `run(context, config)`.
///
/// ```text
/// new() -> match_rules() -> resolve_hits()
///  │          └─ one hit per firing rule
///  └─ trigger scan + gating
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    query: &'a NormalizedQuery,
    compiled: CompiledRules<'a>,
    /// Active rules in evaluation order.
    active: Vec<&'a Rule>,
}

impl<'a> Parser<'a> {
    /// Create a new `Parser` for `query` using pre-compiled rules.
    pub fn new_compiled(query: &'a NormalizedQuery, compiled: CompiledRules<'a>) -> Self {
        let trigger_info = TriggerInfo::scan(query);
        debug!(buckets = ?trigger_info.buckets, phrases = ?trigger_info.phrases, "trigger scan");

        let candidates = compiled.candidates(trigger_info.buckets);
        let bucket_active = candidates.len();

        // Phrase gating: at least one optional phrase must be a query token.
        let active: Vec<&Rule> = candidates
            .into_iter()
            .filter(|&id| {
                let meta = &compiled.metas[id];
                let keep = meta.optional_phrases.is_empty()
                    || meta.optional_phrases.iter().any(|&phrase| trigger_info.phrases.contains(phrase));
                if !keep {
                    trace!(rule = compiled.rules[id].name, category = ?meta.category, "no trigger phrase");
                }
                keep
            })
            .map(|id| compiled.rules[id])
            .collect();

        debug!(
            active = active.len(),
            total = compiled.rules.len(),
            phrase_filtered = bucket_active - active.len(),
            "active rules"
        );

        Parser { query, compiled, active }
    }

    /// Create a new `Parser` for `query` using `rules`.
    ///
    /// This is a convenience wrapper that builds a temporary `CompiledRules`.
    pub fn new(query: &'a NormalizedQuery, rules: &'a [Rule]) -> Self {
        Self::new_compiled(query, CompiledRules::new(rules))
    }

    /// Names of the rules that survived gating, in evaluation order.
    pub(crate) fn active_rule_names(&self) -> Vec<&'static str> {
        self.active.iter().map(|r| r.name).collect()
    }

    pub(crate) fn total_rules(&self) -> usize {
        self.compiled.rules.len()
    }

    /// Run every active rule once and collect the ones that fired.
    pub(crate) fn match_rules(&self, env: &RuleEnv<'_>) -> Vec<RuleHit> {
        let text = self.query.text();
        let mut hits = Vec::new();

        for rule in &self.active {
            for caps in rule.pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let rule_match = RuleMatch {
                    range: Range { start: whole.start(), end: whole.end() },
                    groups: (0..caps.len()).map(|i| caps.get(i).map(|g| g.as_str())).collect(),
                    tail: text[whole.end()..].split_whitespace().collect(),
                };

                match (rule.production)(&rule_match, env) {
                    Some(outcome) => {
                        let hit = RuleHit {
                            rule: rule.name,
                            category: rule.category,
                            term: hit_term(&rule_match, &outcome),
                            range: rule_match.range,
                            outcome,
                        };
                        debug!(rule = hit.rule, category = %hit.category, term = %hit.term, outcome = %hit.outcome, "rule fired");
                        hits.push(hit);
                        break;
                    }
                    None => {
                        trace!(rule = rule.name, start = whole.start(), end = whole.end(), "production declined");
                    }
                }
            }
        }

        hits
    }

    pub fn run_with_metrics(self, context: &Context, config: &Config) -> Result<RunResult, QueryError> {
        let start = Instant::now();
        let env = RuleEnv { config };
        let hits = self.match_rules(&env);
        let matching = start.elapsed();

        let resolve_start = Instant::now();
        let resolution = resolve_hits(context, config, hits)?;
        let resolve = resolve_start.elapsed();

        Ok(RunResult {
            spec: resolution.spec,
            decisions: resolution.decisions,
            active_rules: self.active_rule_names(),
            total_rules: self.total_rules(),
            metrics: RunMetrics { total: start.elapsed(), matching, resolve },
        })
    }

    pub fn run(self, context: &Context, config: &Config) -> Result<QuerySpec, QueryError> {
        self.run_with_metrics(context, config).map(|r| r.spec)
    }
}

/// The matched words, extended by a captured name when the rule took one from
/// the tail ("for" + "acme" -> "for acme").
fn hit_term(rule_match: &RuleMatch<'_>, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Filter(fragment) => match &fragment.value {
            FragmentValue::Fixed(Value::Text(name)) => format!("{} {}", rule_match.term(), name),
            _ => rule_match.term().to_string(),
        },
        _ => rule_match.term().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynonymTable;

    fn hits_for(raw: &str) -> Vec<RuleHit> {
        let config = Config::default();
        let query = NormalizedQuery::parse(raw, &config, &SynonymTable::builtin()).unwrap();
        let rules = crate::rules::get();
        let parser = Parser::new(&query, &rules);
        parser.match_rules(&RuleEnv { config: &config })
    }

    #[test]
    fn hits_follow_category_order() {
        let hits = hits_for("tickets for acme last 7 days urgent my");
        let categories: Vec<Category> = hits.iter().map(|h| h.category).collect();
        assert_eq!(categories, vec![Category::Ownership, Category::Priority, Category::Customer, Category::Time]);
    }

    #[test]
    fn rule_fires_once_on_first_productive_match() {
        let hits = hits_for("show 5 tickets or 20 tickets");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].outcome, Outcome::Limit(5));
        assert_eq!(hits[0].term, "5 tickets");
    }

    #[test]
    fn declined_match_falls_through_to_next_one() {
        // "for today" yields an empty name; "from acme" is the first usable one.
        let hits = hits_for("tickets for today from acme");
        let customer: Vec<&RuleHit> = hits.iter().filter(|h| h.category == Category::Customer).collect();
        assert_eq!(customer.len(), 1);
        assert_eq!(customer[0].term, "from acme");
    }

    #[test]
    fn gating_skips_rules_without_phrases() {
        let config = Config::default();
        let query = NormalizedQuery::parse("show my tickets", &config, &SynonymTable::builtin()).unwrap();
        let rules = crate::rules::get();
        let parser = Parser::new(&query, &rules);
        assert_eq!(parser.active_rule_names(), vec!["my"]);
    }
}
