//! Status rules. A ticket is open while its close date is unset.

use crate::{Category, FilterFragment, Operator, Rule, TicketField, Value};

pub fn rule_open() -> Rule {
    rule! {
        name: "open",
        category: Category::Status,
        pattern: r"\bopen\b",
        optional_phrases: ["open"],
        prod: |_m, _env| -> Option<FilterFragment> {
            Some(FilterFragment::fixed(TicketField::ClosedAt, Operator::Eq, Value::Empty))
        }
    }
}

pub fn rule_closed() -> Rule {
    rule! {
        name: "closed",
        category: Category::Status,
        pattern: r"\bclosed\b",
        optional_phrases: ["closed"],
        prod: |_m, _env| -> Option<FilterFragment> {
            Some(FilterFragment::fixed(TicketField::ClosedAt, Operator::Ne, Value::Empty))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_open(), rule_closed()]
}
