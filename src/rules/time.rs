//! Time rules. Each emits a lower bound on `updated_at` as a relative anchor;
//! the resolver turns it into a timestamp against the call's reference time.

use crate::engine::BucketMask;
use crate::{Category, FilterFragment, Grain, Operator, Rule, TicketField, TimeAnchor};

fn updated_since(anchor: TimeAnchor) -> FilterFragment {
    FilterFragment::relative(TicketField::UpdatedAt, Operator::Ge, anchor)
}

pub fn rule_today() -> Rule {
    rule! {
        name: "today",
        category: Category::Time,
        pattern: r"\btoday\b",
        optional_phrases: ["today"],
        buckets: BucketMask::TIMEISH.bits(),
        prod: |_m, _env| -> Option<FilterFragment> {
            Some(updated_since(TimeAnchor::StartOf(Grain::Day)))
        }
    }
}

/// "this week" / "this month" / "this quarter" / "this year"
pub fn rule_this_grain() -> Rule {
    rule! {
        name: "this <grain>",
        category: Category::Time,
        pattern: r"\bthis (week|month|quarter|year)\b",
        optional_phrases: ["this"],
        buckets: BucketMask::TIMEISH.bits(),
        prod: |m, _env| -> Option<FilterFragment> {
            let grain = match m.group(1)? {
                "week" => Grain::Week,
                "month" => Grain::Month,
                "quarter" => Grain::Quarter,
                "year" => Grain::Year,
                _ => return None,
            };
            Some(updated_since(TimeAnchor::StartOf(grain)))
        }
    }
}

/// "last 7 days", "last 2 weeks", "last 3 months"
pub fn rule_last_n() -> Rule {
    rule! {
        name: "last <n> <grain>",
        category: Category::Time,
        pattern: r"\blast (\d{1,5}) (day|week|month)s?\b",
        optional_phrases: ["last"],
        buckets: BucketMask::HAS_DIGITS.bits(),
        prod: |m, _env| -> Option<FilterFragment> {
            let amount = u32::try_from(m.int_group(1)?).ok()?;
            let grain = match m.group(2)? {
                "day" => Grain::Day,
                "week" => Grain::Week,
                "month" => Grain::Month,
                _ => return None,
            };
            Some(updated_since(TimeAnchor::Last { amount, grain }))
        }
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_today(), rule_this_grain(), rule_last_n()]
}
