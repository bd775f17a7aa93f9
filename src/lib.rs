use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[macro_use]
mod macros;
mod adapter;
mod api;
mod config;
mod engine;
mod error;
mod normalize;
mod query_spec;
mod response;
mod rules;
mod summary;
mod time_range;

pub use adapter::{
    BackendError, BackendSession, Connector, Credentials, MemoryBackend, SessionSearch, SessionState, TicketRecord,
    TicketSearch,
};
pub use api::{
    Caller, Context, HitStatus, RuleHitSummary, Translation, TranslationDetails, TranslationVerbose, Translator,
    translate, translate_verbose_with, translate_with,
};
pub use config::{Config, ConfigError, HARD_MAX_LIMIT, PriorityCodes};
pub use error::{QueryError, ValidationError};
pub use normalize::{NormalizedQuery, SynonymTable};
pub use query_spec::{Access, Direction, FIELD_ALLOW_LIST, FilterCriterion, QuerySpec, SortOrder};
pub use response::{QueryRequest, QueryResponse, TicketView, handle_query};
pub use summary::summarize;
pub use time_range::{Grain, TimeAnchor};

// --- Vocabulary -------------------------------------------------------------

/// Logical filter categories. The declaration order is the evaluation order
/// of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ownership,
    Status,
    Priority,
    Customer,
    Project,
    Time,
    Limit,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Ownership,
        Category::Status,
        Category::Priority,
        Category::Customer,
        Category::Project,
        Category::Time,
        Category::Limit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Ownership => "ownership",
            Category::Status => "status",
            Category::Priority => "priority",
            Category::Customer => "customer",
            Category::Project => "project",
            Category::Time => "time",
            Category::Limit => "limit",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison operators a criterion may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "in")]
    In,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::ILike => "ilike",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Ticket fields known to the translator, with their backend names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    Id,
    Title,
    Assignee,
    Customer,
    Project,
    Stage,
    Priority,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    Description,
}

impl TicketField {
    /// Column name on the `helpdesk.ticket` model.
    pub fn backend_name(self) -> &'static str {
        match self {
            TicketField::Id => "id",
            TicketField::Title => "name",
            TicketField::Assignee => "user_id",
            TicketField::Customer => "partner_id",
            TicketField::Project => "project_id",
            TicketField::Stage => "stage_id",
            TicketField::Priority => "priority",
            TicketField::CreatedAt => "create_date",
            TicketField::UpdatedAt => "write_date",
            TicketField::ClosedAt => "close_date",
            TicketField::Description => "description",
        }
    }

    /// Path used when filtering. Related records are matched by name.
    pub fn filter_path(self) -> &'static str {
        match self {
            TicketField::Customer => "partner_id.name",
            TicketField::Project => "project_id.name",
            other => other.backend_name(),
        }
    }
}

/// A concrete criterion value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Integer(i64),
    Text(String),
    List(Vec<String>),
    Timestamp(NaiveDateTime),
    /// "No value"; an unset timestamp or relation.
    Empty,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Empty => f.write_str("empty"),
        }
    }
}

// --- Rule production types ---------------------------------------------------

/// Fragment value as produced by a rule. Relative times and the caller
/// placeholder are resolved later, against the per-call `Context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FragmentValue {
    Fixed(Value),
    Relative(TimeAnchor),
    Caller,
}

impl fmt::Display for FragmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentValue::Fixed(v) => write!(f, "{v}"),
            FragmentValue::Relative(anchor) => write!(f, "<{anchor}>"),
            FragmentValue::Caller => f.write_str("<caller>"),
        }
    }
}

/// One `(field, operator, value)` constraint produced by a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilterFragment {
    pub field: TicketField,
    pub operator: Operator,
    pub value: FragmentValue,
}

impl FilterFragment {
    pub fn fixed(field: TicketField, operator: Operator, value: Value) -> Self {
        FilterFragment { field, operator, value: FragmentValue::Fixed(value) }
    }

    pub fn relative(field: TicketField, operator: Operator, anchor: TimeAnchor) -> Self {
        FilterFragment { field, operator, value: FragmentValue::Relative(anchor) }
    }

    pub fn caller(field: TicketField) -> Self {
        FilterFragment { field, operator: Operator::Eq, value: FragmentValue::Caller }
    }
}

impl fmt::Display for FilterFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.filter_path(), self.operator, self.value)
    }
}

/// Marker outcome: occupy a category without adding a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Claim;

/// Requested result count, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limit(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Filter(FilterFragment),
    Limit(u64),
    Claim,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Filter(fragment) => write!(f, "{fragment}"),
            Outcome::Limit(n) => write!(f, "limit {n}"),
            Outcome::Claim => f.write_str("(no filter)"),
        }
    }
}

// Trait to convert rule production results into outcomes
pub(crate) trait IntoOutcome {
    fn into_outcome(self) -> Option<Outcome>;
}

impl IntoOutcome for FilterFragment {
    fn into_outcome(self) -> Option<Outcome> {
        Some(Outcome::Filter(self))
    }
}

impl IntoOutcome for Limit {
    fn into_outcome(self) -> Option<Outcome> {
        Some(Outcome::Limit(self.0))
    }
}

impl IntoOutcome for Claim {
    fn into_outcome(self) -> Option<Outcome> {
        Some(Outcome::Claim)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

/// A single regex hit on the normalized text, handed to a rule production.
///
/// `tail` holds the tokens that follow the match, which lets rules capture an
/// open-ended span such as a customer name.
#[derive(Debug, Clone)]
pub(crate) struct RuleMatch<'a> {
    pub range: Range,
    pub groups: Vec<Option<&'a str>>,
    pub tail: Vec<&'a str>,
}

impl<'a> RuleMatch<'a> {
    /// The whole matched text, trimmed.
    pub fn term(&self) -> &'a str {
        self.groups.first().copied().flatten().unwrap_or("").trim()
    }

    pub fn group(&self, idx: usize) -> Option<&'a str> {
        self.groups.get(idx).copied().flatten()
    }

    /// Parse an all-digit capture group. Values too large for `u64`
    /// saturate instead of failing.
    pub fn int_group(&self, idx: usize) -> Option<u64> {
        let digits = self.group(idx)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(digits.parse::<u64>().unwrap_or(u64::MAX))
    }
}

/// Per-call environment visible to rule productions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleEnv<'a> {
    pub config: &'a Config,
}

pub(crate) type Production = Box<dyn Fn(&RuleMatch<'_>, &RuleEnv<'_>) -> Option<Outcome> + Send + Sync>;

/// A rule: a name, the category it fills, a regex over the normalized text
/// and a `production` that turns a match into an outcome.
///
/// `optional_phrases` and `buckets` gate activation before any regex runs.
pub(crate) struct Rule {
    pub name: &'static str,
    pub category: Category,
    pub pattern: &'static Regex,
    pub production: Production,
    /// Optional phrases - ANY one must appear in input for this rule to activate (OR logic).
    pub optional_phrases: &'static [&'static str],
    /// Bucket mask - rule only activates if input has matching buckets.
    pub buckets: u32,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("pattern", &self.pattern.as_str())
            .field("production", &"<function>")
            .field("buckets", &self.buckets)
            .finish()
    }
}
