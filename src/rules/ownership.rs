//! Ownership rules

use crate::{Category, Claim, FilterFragment, Rule, TicketField};

/// "all tickets": the category is taken, no assignee filter.
///
/// Declared before `rule_my` so "all" wins wherever it appears.
pub fn rule_all() -> Rule {
    rule! {
        name: "all",
        category: Category::Ownership,
        pattern: r"\ball\b",
        optional_phrases: ["all"],
        prod: |_m, _env| -> Option<Claim> {
            Some(Claim)
        }
    }
}

/// "my tickets": assigned to whoever is asking.
pub fn rule_my() -> Rule {
    rule! {
        name: "my",
        category: Category::Ownership,
        pattern: r"\bmy\b",
        optional_phrases: ["my"],
        prod: |_m, _env| -> Option<FilterFragment> {
            Some(FilterFragment::caller(TicketField::Assignee))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_all(), rule_my()]
}
