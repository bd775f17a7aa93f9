//! The rule table.
//!
//! One file per category. `get` returns every rule; the engine orders them by
//! category, so the order here only matters inside a category.

use crate::Rule;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

pub(crate) mod customer;
pub(crate) mod limit;
pub(crate) mod ownership;
pub(crate) mod priority;
pub(crate) mod status;
pub(crate) mod time;


pub fn get() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(ownership::get());
    rules.extend(status::get());
    rules.extend(priority::get());
    rules.extend(customer::get());
    rules.extend(time::get());
    rules.extend(limit::get());
    rules
}

/// Every trigger phrase in the table. A captured name ends before any of them,
/// so one word never feeds two filters.
pub(crate) static TRIGGER_PHRASES: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| get().iter().flat_map(|r| r.optional_phrases.iter().copied()).collect());
