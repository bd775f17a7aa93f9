use crate::config::{Config, ConfigError};
use crate::engine::{self, RuleHit};
use crate::error::QueryError;
use crate::normalize::{NormalizedQuery, SynonymTable};
use crate::query_spec::QuerySpec;
use crate::summary::summarize;
use crate::{Category, Rule};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

static DEFAULT_RULES: Lazy<Vec<Rule>> = Lazy::new(crate::rules::get);

static DEFAULT_TRANSLATOR: Lazy<Translator> = Lazy::new(Translator::default);

/// The person asking. "my" resolves to `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: i64,
    pub name: String,
}

/// Translation context, captured once per call.
///
/// Holds what relative expressions ("today", "my") resolve against.
#[derive(Debug, Clone)]
pub struct Context {
    /// Reference datetime used to resolve relative expressions.
    pub reference_time: NaiveDateTime,
    /// Requesting user, if known.
    pub caller: Option<Caller>,
}

impl Context {
    pub fn new(reference_time: NaiveDateTime) -> Self {
        Self { reference_time, caller: None }
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            let date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
            let time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
            Self::new(NaiveDateTime::new(date, time))
        } else {
            Self::new(Local::now().naive_local())
        }
    }
}

/// Result from [`translate`] and [`Translator::translate`].
#[derive(Debug, Clone)]
pub struct Translation {
    /// The raw input text.
    pub text: String,
    /// The text the rules ran against.
    pub normalized: String,
    pub spec: QuerySpec,
    pub summary: String,
    /// Total elapsed time spent normalizing, matching and resolving.
    pub elapsed: Duration,
}

/// What the resolver did with a rule hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitStatus {
    /// First hit of its category; contributes to the spec.
    Accepted,
    /// Same outcome as the accepted hit of its category.
    Duplicate,
    /// Its category was claimed by an earlier rule.
    Suppressed,
}

impl HitStatus {
    pub fn name(self) -> &'static str {
        match self {
            HitStatus::Accepted => "accepted",
            HitStatus::Duplicate => "duplicate",
            HitStatus::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for HitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compact rule hit summary used in verbose traces.
#[derive(Debug, Clone, Serialize)]
pub struct RuleHitSummary {
    pub rule: String,
    pub category: Category,
    pub term: String,
    /// Byte offsets into the normalized text.
    pub start: usize,
    pub end: usize,
    /// Outcome before resolution, e.g. `user_id = <caller>`.
    pub preview: String,
    pub status: HitStatus,
}

/// Additional details returned by [`translate_verbose_with`] and
/// [`Translator::translate_verbose`].
#[derive(Debug, Clone)]
pub struct TranslationDetails {
    /// Engine time (matching + resolution).
    pub total: Duration,
    pub matching: Duration,
    pub resolve: Duration,
    /// Names of rules that were active for this input, in evaluation order.
    pub active_rules: Vec<String>,
    pub total_rules: usize,
    /// Every rule that fired, in evaluation order.
    pub hits: Vec<RuleHitSummary>,
}

#[derive(Debug, Clone)]
pub struct TranslationVerbose {
    pub text: String,
    pub normalized: String,
    pub spec: QuerySpec,
    pub summary: String,
    pub elapsed: Duration,
    pub details: TranslationDetails,
}

/// A configured translator.
///
/// Holds the configuration and the synonym table built from it; the rule table
/// itself is shared by every translator. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct Translator {
    config: Config,
    synonyms: SynonymTable,
}

impl Default for Translator {
    fn default() -> Self {
        let config = Config::default();
        let synonyms = SynonymTable::with_config(&config);
        Translator { config, synonyms }
    }
}

impl Translator {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let synonyms = SynonymTable::with_config(&config);
        Ok(Translator { config, synonyms })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn translate(&self, text: &str, context: &Context) -> Result<Translation, QueryError> {
        let start = Instant::now();
        let query = NormalizedQuery::parse(text, &self.config, &self.synonyms)?;
        let spec = engine::Parser::new(&query, &DEFAULT_RULES).run(context, &self.config)?;
        let summary = summarize(&spec, &self.config);

        Ok(Translation {
            text: text.to_string(),
            normalized: query.text().to_string(),
            spec,
            summary,
            elapsed: start.elapsed(),
        })
    }

    /// Like [`Translator::translate`], with the rule trace attached.
    pub fn translate_verbose(&self, text: &str, context: &Context) -> Result<TranslationVerbose, QueryError> {
        let start = Instant::now();
        let query = NormalizedQuery::parse(text, &self.config, &self.synonyms)?;
        let run = engine::Parser::new(&query, &DEFAULT_RULES).run_with_metrics(context, &self.config)?;
        let summary = summarize(&run.spec, &self.config);

        let details = TranslationDetails {
            total: run.metrics.total,
            matching: run.metrics.matching,
            resolve: run.metrics.resolve,
            active_rules: run.active_rules.iter().map(|s| s.to_string()).collect(),
            total_rules: run.total_rules,
            hits: run.decisions.iter().map(|(hit, status)| hit_to_summary(hit, *status)).collect(),
        };

        Ok(TranslationVerbose {
            text: text.to_string(),
            normalized: query.text().to_string(),
            spec: run.spec,
            summary,
            elapsed: start.elapsed(),
            details,
        })
    }
}

/// Translate `text` with the default configuration.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use helpdesk_query::{Caller, Context, translate};
///
/// let now = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let ctx = Context::new(now).with_caller(Caller { id: 2, name: "Mitchell Admin".into() });
///
/// let out = translate("show my open tickets", &ctx).unwrap();
/// assert_eq!(out.spec.criteria().len(), 2);
/// assert_eq!(out.summary, "Your open tickets (limit: 50)");
/// ```
pub fn translate(text: &str, context: &Context) -> Result<Translation, QueryError> {
    DEFAULT_TRANSLATOR.translate(text, context)
}

/// Translate `text` with an explicit translator.
pub fn translate_with(translator: &Translator, text: &str, context: &Context) -> Result<Translation, QueryError> {
    translator.translate(text, context)
}

/// Translate `text` with `translator` and return the rule trace as well.
///
/// Meant for debugging rules; [`translate_with`] does not collect the trace.
pub fn translate_verbose_with(
    translator: &Translator,
    text: &str,
    context: &Context,
) -> Result<TranslationVerbose, QueryError> {
    translator.translate_verbose(text, context)
}

fn hit_to_summary(hit: &RuleHit, status: HitStatus) -> RuleHitSummary {
    let preview: String = hit.outcome.to_string().chars().take(80).collect();
    RuleHitSummary {
        rule: hit.rule.to_string(),
        category: hit.category,
        term: hit.term.clone(),
        start: hit.range.start,
        end: hit.range.end,
        preview,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Operator, TicketField, ValidationError, Value};
    use chrono::{Datelike, Duration as ChronoDuration};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(14, 30, 0).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> Value {
        Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    fn reference_context() -> Context {
        Context::new(at(2024, 5, 15)).with_caller(Caller { id: 2, name: "Mitchell Admin".to_string() })
    }

    fn spec(text: &str) -> QuerySpec {
        translate(text, &reference_context()).unwrap().spec
    }

    fn cutoff(text: &str, now: NaiveDateTime) -> NaiveDateTime {
        let out = translate(text, &Context::new(now)).unwrap();
        match out.spec.criterion(Category::Time).map(|c| &c.value) {
            Some(Value::Timestamp(ts)) => *ts,
            other => panic!("no time cutoff for {text:?}: {other:?}"),
        }
    }

    #[test]
    fn my_open_tickets() {
        let s = spec("show my open tickets");
        let assignee = s.criterion(Category::Ownership).unwrap();
        assert_eq!(assignee.field, TicketField::Assignee);
        assert_eq!(assignee.operator, Operator::Eq);
        assert_eq!(assignee.value, Value::Integer(2));

        let status = s.criterion(Category::Status).unwrap();
        assert_eq!((status.field, status.operator, &status.value), (TicketField::ClosedAt, Operator::Eq, &Value::Empty));

        assert_eq!(s.criteria().len(), 2);
        assert_eq!(s.limit(), 50);
        assert_eq!(s.order().to_string(), "write_date desc");
    }

    #[test]
    fn urgent_tickets_today() {
        let s = spec("urgent tickets today");
        let priority = s.criterion(Category::Priority).unwrap();
        assert_eq!(priority.operator, Operator::In);
        assert_eq!(priority.value, Value::List(vec!["2".to_string(), "3".to_string()]));

        let time = s.criterion(Category::Time).unwrap();
        assert_eq!(time.field, TicketField::UpdatedAt);
        assert_eq!(time.operator, Operator::Ge);
        assert_eq!(time.value, midnight(2024, 5, 15));
        assert_eq!(s.criteria().len(), 2);
    }

    #[test]
    fn tickets_for_customer() {
        let s = spec("tickets for euroblaze");
        assert_eq!(s.criteria().len(), 1);
        let customer = s.criterion(Category::Customer).unwrap();
        assert_eq!(customer.operator, Operator::ILike);
        assert_eq!(customer.value, Value::Text("euroblaze".to_string()));
    }

    #[test]
    fn limit_only() {
        let s = spec("show 10 tickets");
        assert!(s.criteria().is_empty());
        assert_eq!(s.limit(), 10);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(spec("show 500 tickets").limit(), 100);
        assert_eq!(spec("show 0 tickets").limit(), 1);
    }

    #[test]
    fn all_cancels_my_in_any_position() {
        for text in ["all open tickets", "all my open tickets", "my open tickets all"] {
            let s = spec(text);
            assert_eq!(s.criteria().len(), 1, "{text}");
            assert!(s.criterion(Category::Ownership).is_none(), "{text}");
            assert!(s.criterion(Category::Status).is_some(), "{text}");
        }
    }

    #[test]
    fn open_and_closed_is_ambiguous() {
        let err = translate("my open and closed tickets", &reference_context()).unwrap_err();
        match err {
            QueryError::Ambiguous { category, terms } => {
                assert_eq!(category, Category::Status);
                assert_eq!(terms, vec!["open", "closed"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn conflicting_times_are_ambiguous() {
        let err = translate("tickets today and this week", &reference_context()).unwrap_err();
        assert!(matches!(err, QueryError::Ambiguous { category: Category::Time, .. }));
    }

    #[test]
    fn input_over_bound_is_rejected() {
        let long = "a".repeat(501);
        let err = translate(&long, &reference_context()).unwrap_err();
        assert!(matches!(err, QueryError::Validation(ValidationError::InputTooLong { len: 501, max: 500 })));
    }

    #[test]
    fn my_without_caller_is_rejected() {
        let err = translate("my tickets", &Context::new(at(2024, 5, 15))).unwrap_err();
        assert!(matches!(err, QueryError::Validation(ValidationError::MissingCaller)));
    }

    #[test]
    fn empty_input_is_the_default_view() {
        for text in ["", "   ", "?!"] {
            let out = translate(text, &Context::default()).unwrap();
            assert!(out.spec.criteria().is_empty());
            assert_eq!(out.spec.limit(), 50);
            assert_eq!(out.summary, "All tickets (limit: 50)");
        }
    }

    #[test]
    fn unrecognized_words_are_ignored() {
        let s = spec("please kindly fetch the frobnicated tickets");
        assert!(s.criteria().is_empty());
    }

    #[test]
    fn same_input_gives_identical_spec() {
        let ctx = reference_context();
        let text = "my urgent open tickets for euroblaze last 30 days 20 tickets";
        let a = serde_json::to_string(&translate(text, &ctx).unwrap().spec).unwrap();
        let b = serde_json::to_string(&translate(text, &ctx).unwrap().spec).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cutoffs_are_monotonic() {
        let mut now = at(2024, 1, 1);
        while now < at(2025, 1, 1) {
            let today = cutoff("tickets today", now);
            let week = cutoff("tickets this week", now);
            let month = cutoff("tickets this month", now);
            let last_30 = cutoff("tickets last 30 days", now);

            assert!(today >= week && today >= month, "{now}");
            assert!(week >= last_30 && month >= last_30, "{now}");
            if week.date().month0() == now.date().month0() {
                assert!(week >= month, "{now}");
            }
            now += ChronoDuration::days(1);
        }
    }

    #[test]
    fn relative_cutoffs_resolve_against_reference() {
        // 2024-05-15 is a Wednesday.
        let now = at(2024, 5, 15);
        assert_eq!(Value::Timestamp(cutoff("tickets this week", now)), midnight(2024, 5, 13));
        assert_eq!(Value::Timestamp(cutoff("tickets this month", now)), midnight(2024, 5, 1));
        assert_eq!(Value::Timestamp(cutoff("tickets this quarter", now)), midnight(2024, 4, 1));
        assert_eq!(Value::Timestamp(cutoff("tickets this year", now)), midnight(2024, 1, 1));
        assert_eq!(Value::Timestamp(cutoff("tickets last 7 days", now)), midnight(2024, 5, 8));
        assert_eq!(Value::Timestamp(cutoff("tickets last 2 weeks", now)), midnight(2024, 5, 1));
        assert_eq!(Value::Timestamp(cutoff("tickets last 3 months", now)), midnight(2024, 2, 15));
    }

    #[test]
    fn configured_translator_uses_its_codes() {
        let mut config = Config::default();
        config.priority.high = vec!["3".to_string()];
        config.synonyms.insert("blocker".to_string(), "urgent".to_string());
        let translator = Translator::new(config).unwrap();

        let out = translate_with(&translator, "blocker tickets", &reference_context()).unwrap();
        assert_eq!(out.normalized, "urgent tickets");
        assert_eq!(out.spec.criterion(Category::Priority).unwrap().value, Value::List(vec!["3".to_string()]));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config { default_limit: 0, ..Config::default() };
        assert!(matches!(Translator::new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn verbose_includes_hits_and_rules() {
        let res = translate_verbose_with(&Translator::default(), "all my open tickets", &reference_context()).unwrap();

        assert_eq!(res.normalized, "all my open tickets");
        assert!(res.details.total <= res.elapsed);
        assert!(res.details.active_rules.contains(&"all".to_string()));
        assert!(res.details.active_rules.len() <= res.details.total_rules);

        let statuses: Vec<(&str, HitStatus)> = res.details.hits.iter().map(|h| (h.rule.as_str(), h.status)).collect();
        assert_eq!(
            statuses,
            vec![("all", HitStatus::Accepted), ("my", HitStatus::Suppressed), ("open", HitStatus::Accepted)]
        );
        assert_eq!(res.details.hits[1].preview, "user_id = <caller>");
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn translation_types_are_shareable() {
        assert_send_sync::<Translator>();
        assert_send_sync::<Context>();
        assert_send_sync::<crate::QuerySpec>();
    }

    #[test]
    fn concurrent_calls_agree() {
        let translator = Translator::default();
        let ctx = Context::new(at(2024, 5, 15)).with_caller(Caller { id: 2, name: "Mitchell Admin".to_string() });
        let text = "my urgent open tickets for euroblaze this week";
        let expected = serde_json::to_string(&translator.translate(text, &ctx).unwrap().spec).unwrap();

        let outputs: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| serde_json::to_string(&translator.translate(text, &ctx).unwrap().spec).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outputs.len(), 8);
        assert!(outputs.iter().all(|o| *o == expected));
    }
}
