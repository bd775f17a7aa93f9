//! Result limit.

use crate::engine::BucketMask;
use crate::{Category, Limit, Rule};

/// "10 tickets". Only the first such number counts; clamping happens in the
/// builder.
pub fn rule_n_tickets() -> Rule {
    rule! {
        name: "<n> tickets",
        category: Category::Limit,
        pattern: r"\b(\d+) tickets?\b",
        optional_phrases: ["ticket", "tickets"],
        buckets: BucketMask::HAS_DIGITS.bits(),
        prod: |m, _env| -> Option<Limit> {
            Some(Limit(m.int_group(1)?))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_n_tickets()]
}
