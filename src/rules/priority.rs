//! Priority rules. The code sets come from `Config::priority`.

use crate::{Category, FilterFragment, Operator, Rule, TicketField, Value};

fn priority_in(codes: &[String]) -> FilterFragment {
    FilterFragment::fixed(TicketField::Priority, Operator::In, Value::List(codes.to_vec()))
}

/// "urgent" (also "high", "critical", "asap" after synonyms)
pub fn rule_urgent() -> Rule {
    rule! {
        name: "urgent",
        category: Category::Priority,
        pattern: r"\burgent\b",
        optional_phrases: ["urgent"],
        prod: |_m, env| -> Option<FilterFragment> {
            Some(priority_in(&env.config.priority.high))
        }
    }
}

/// "medium" / "normal"
pub fn rule_medium() -> Rule {
    rule! {
        name: "medium",
        category: Category::Priority,
        pattern: r"\bmedium\b",
        optional_phrases: ["medium"],
        prod: |_m, env| -> Option<FilterFragment> {
            Some(priority_in(&env.config.priority.medium))
        }
    }
}

pub fn rule_low() -> Rule {
    rule! {
        name: "low",
        category: Category::Priority,
        pattern: r"\blow\b",
        optional_phrases: ["low"],
        prod: |_m, env| -> Option<FilterFragment> {
            Some(priority_in(&env.config.priority.low))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_urgent(), rule_medium(), rule_low()]
}
