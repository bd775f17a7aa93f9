//! The immutable query specification handed to the execution adapter.

use crate::config::{Config, HARD_MAX_LIMIT};
use crate::{Category, Operator, TicketField, Value};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Fields the adapter may return. Anything else on the backend model stays
/// internal.
pub const FIELD_ALLOW_LIST: [TicketField; 11] = [
    TicketField::Id,
    TicketField::Title,
    TicketField::Assignee,
    TicketField::Customer,
    TicketField::Project,
    TicketField::Stage,
    TicketField::Priority,
    TicketField::CreatedAt,
    TicketField::UpdatedAt,
    TicketField::ClosedAt,
    TicketField::Description,
];

/// A fragment accepted into the final query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriterion {
    pub category: Category,
    pub field: TicketField,
    pub operator: Operator,
    pub value: Value,
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.filter_path(), self.operator, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub field: TicketField,
    pub direction: Direction,
}

impl SortOrder {
    /// Most recently updated first.
    pub const fn recent_first() -> Self {
        SortOrder { field: TicketField::UpdatedAt, direction: Direction::Desc }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{} {}", self.field.backend_name(), dir)
    }
}

/// What a query is allowed to do on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
}

impl Category {
    /// Access level a criterion of this category needs.
    pub fn access(self) -> Access {
        match self {
            Category::Ownership
            | Category::Status
            | Category::Priority
            | Category::Customer
            | Category::Project
            | Category::Time
            | Category::Limit => Access::Read,
        }
    }
}

/// Criteria (AND-combined), limit, order and projection for one request.
///
/// Built only through [`QuerySpecBuilder`]; there is no way to mutate a spec
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    criteria: Vec<FilterCriterion>,
    limit: u32,
    order: SortOrder,
    fields: Vec<TicketField>,
    access: Access,
}

impl QuerySpec {
    /// Criteria in category order, at most one per category.
    pub fn criteria(&self) -> &[FilterCriterion] {
        &self.criteria
    }

    pub fn criterion(&self, category: Category) -> Option<&FilterCriterion> {
        self.criteria.iter().find(|c| c.category == category)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn fields(&self) -> &[TicketField] {
        &self.fields
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Backend names of the projected fields.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.backend_name()).collect()
    }

    /// The criteria as an Odoo search domain: `[[path, op, value], ...]`.
    pub fn domain(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.criteria.iter().map(|c| json!([c.field.filter_path(), c.operator.symbol(), domain_value(&c.value)])).collect(),
        )
    }
}

fn domain_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(v) => json!(v),
        Value::Text(s) => json!(s),
        Value::List(items) => json!(items),
        Value::Timestamp(ts) => json!(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Empty => json!(false),
    }
}

/// Assembles a [`QuerySpec`].
///
/// The first criterion recorded for a category is kept; the resolver is the
/// only caller and never offers two.
#[derive(Debug, Clone)]
pub(crate) struct QuerySpecBuilder {
    criteria: BTreeMap<Category, FilterCriterion>,
    requested_limit: Option<u64>,
    default_limit: u32,
    max_limit: u32,
}

impl QuerySpecBuilder {
    pub fn new(config: &Config) -> Self {
        QuerySpecBuilder {
            criteria: BTreeMap::new(),
            requested_limit: None,
            default_limit: config.default_limit,
            max_limit: config.max_limit.min(HARD_MAX_LIMIT),
        }
    }

    pub fn criterion(&mut self, criterion: FilterCriterion) -> &mut Self {
        self.criteria.entry(criterion.category).or_insert(criterion);
        self
    }

    pub fn limit(&mut self, requested: u64) -> &mut Self {
        self.requested_limit.get_or_insert(requested);
        self
    }

    pub fn build(&self) -> QuerySpec {
        for category in self.criteria.keys() {
            // A new access level must be threaded through here explicitly.
            match category.access() {
                Access::Read => {}
            }
        }

        let requested = self.requested_limit.unwrap_or(self.default_limit as u64);
        let limit = requested.clamp(1, self.max_limit as u64) as u32;

        QuerySpec {
            criteria: self.criteria.values().cloned().collect(),
            limit,
            order: SortOrder::recent_first(),
            fields: FIELD_ALLOW_LIST.to_vec(),
            access: Access::Read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::new(&Config::default())
    }

    #[test]
    fn defaults_without_criteria() {
        let spec = builder().build();
        assert!(spec.criteria().is_empty());
        assert_eq!(spec.limit(), 50);
        assert_eq!(spec.order().to_string(), "write_date desc");
        assert_eq!(spec.fields(), FIELD_ALLOW_LIST.as_slice());
        assert_eq!(spec.access(), Access::Read);
    }

    #[test]
    fn clamps_limit_both_ways() {
        assert_eq!(builder().limit(500).build().limit(), 100);
        assert_eq!(builder().limit(0).build().limit(), 1);
        assert_eq!(builder().limit(u64::MAX).build().limit(), 100);
        assert_eq!(builder().limit(7).build().limit(), 7);
    }

    #[test]
    fn clamps_to_configured_max() {
        let config = Config { max_limit: 20, default_limit: 10, ..Config::default() };
        let spec = QuerySpecBuilder::new(&config).limit(50).build();
        assert_eq!(spec.limit(), 20);
    }

    #[test]
    fn keeps_first_criterion_and_sorts_by_category() {
        let mut b = builder();
        b.criterion(FilterCriterion {
            category: Category::Status,
            field: TicketField::ClosedAt,
            operator: Operator::Eq,
            value: Value::Empty,
        })
        .criterion(FilterCriterion {
            category: Category::Ownership,
            field: TicketField::Assignee,
            operator: Operator::Eq,
            value: Value::Integer(2),
        })
        .criterion(FilterCriterion {
            category: Category::Status,
            field: TicketField::ClosedAt,
            operator: Operator::Ne,
            value: Value::Empty,
        });
        let spec = b.build();

        let categories: Vec<Category> = spec.criteria().iter().map(|c| c.category).collect();
        assert_eq!(categories, vec![Category::Ownership, Category::Status]);
        assert_eq!(spec.criterion(Category::Status).unwrap().operator, Operator::Eq);
    }

    #[test]
    fn renders_odoo_domain() {
        let since = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut b = builder();
        b.criterion(FilterCriterion {
            category: Category::Status,
            field: TicketField::ClosedAt,
            operator: Operator::Eq,
            value: Value::Empty,
        })
        .criterion(FilterCriterion {
            category: Category::Customer,
            field: TicketField::Customer,
            operator: Operator::ILike,
            value: Value::Text("euroblaze".to_string()),
        })
        .criterion(FilterCriterion {
            category: Category::Time,
            field: TicketField::UpdatedAt,
            operator: Operator::Ge,
            value: Value::Timestamp(since),
        });

        assert_eq!(
            b.build().domain(),
            json!([
                ["close_date", "=", false],
                ["partner_id.name", "ilike", "euroblaze"],
                ["write_date", ">=", "2024-05-13 00:00:00"],
            ])
        );
    }
}
