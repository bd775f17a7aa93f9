//! Filter resolution.
//!
//! Hits arrive in evaluation order. Per category the first hit is accepted;
//! a later hit with the same outcome is a duplicate, and a later hit with a
//! different one is a conflict that fails the whole query. A claim (ownership
//! "all") suppresses everything after it in its category.
//!
//! ```text
//! hits:  [all] [my] [open] [closed]
//!          │     │     │       └─ differs from "open" -> Ambiguous(status)
//!          │     │     └─ accepted
//!          │     └─ suppressed by the claim
//!          └─ accepted (no criterion)
//! ```
//!
//! Accepted fragments are then made concrete against the per-call `Context`:
//! relative anchors become timestamps, the caller placeholder becomes the
//! caller's id.

use super::parser::RuleHit;
use crate::query_spec::QuerySpecBuilder;
use crate::{
    Category, Config, Context, FilterCriterion, FragmentValue, HitStatus, Outcome, QueryError, QuerySpec,
    ValidationError, Value,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Resolver output: the spec plus what happened to every hit.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub spec: QuerySpec,
    pub decisions: Vec<(RuleHit, HitStatus)>,
}

pub(crate) fn resolve_hits(context: &Context, config: &Config, hits: Vec<RuleHit>) -> Result<Resolution, QueryError> {
    let mut decisions: Vec<(RuleHit, HitStatus)> = Vec::with_capacity(hits.len());
    // Category -> index of its accepted hit in `decisions`.
    let mut accepted: BTreeMap<Category, usize> = BTreeMap::new();
    let mut conflicts: BTreeMap<Category, Vec<String>> = BTreeMap::new();

    for hit in hits {
        let Some(&first) = accepted.get(&hit.category) else {
            accepted.insert(hit.category, decisions.len());
            decisions.push((hit, HitStatus::Accepted));
            continue;
        };

        let kept = &decisions[first].0;
        let status = if kept.outcome == Outcome::Claim {
            HitStatus::Suppressed
        } else if kept.outcome == hit.outcome {
            HitStatus::Duplicate
        } else {
            let terms = conflicts.entry(hit.category).or_insert_with(|| vec![kept.term.clone()]);
            if !terms.contains(&hit.term) {
                terms.push(hit.term.clone());
            }
            continue;
        };
        debug!(rule = hit.rule, category = %hit.category, status = ?status, "hit not used");
        decisions.push((hit, status));
    }

    if let Some((category, terms)) = conflicts.into_iter().next() {
        debug!(category = %category, terms = ?terms, "ambiguous query");
        return Err(QueryError::Ambiguous { category, terms });
    }

    let mut builder = QuerySpecBuilder::new(config);
    for (hit, status) in &decisions {
        if *status != HitStatus::Accepted {
            continue;
        }
        match &hit.outcome {
            Outcome::Filter(fragment) => {
                let value = resolve_value(&fragment.value, context)?;
                builder.criterion(FilterCriterion {
                    category: hit.category,
                    field: fragment.field,
                    operator: fragment.operator,
                    value,
                });
            }
            Outcome::Limit(n) => {
                builder.limit(*n);
            }
            Outcome::Claim => {}
        }
    }

    let spec = builder.build();
    debug!(criteria = spec.criteria().len(), limit = spec.limit(), "resolved");
    Ok(Resolution { spec, decisions })
}

fn resolve_value(value: &FragmentValue, context: &Context) -> Result<Value, ValidationError> {
    match value {
        FragmentValue::Fixed(v) => Ok(v.clone()),
        FragmentValue::Relative(anchor) => Ok(Value::Timestamp(anchor.resolve(context.reference_time))),
        FragmentValue::Caller => {
            context.caller.as_ref().map(|caller| Value::Integer(caller.id)).ok_or(ValidationError::MissingCaller)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Caller, FilterFragment, Grain, Operator, Range, TicketField, TimeAnchor};
    use chrono::NaiveDate;

    fn hit(rule: &'static str, category: Category, outcome: Outcome) -> RuleHit {
        RuleHit { rule, category, term: rule.to_string(), range: Range { start: 0, end: rule.len() }, outcome }
    }

    fn open() -> Outcome {
        Outcome::Filter(FilterFragment::fixed(TicketField::ClosedAt, Operator::Eq, Value::Empty))
    }

    fn closed() -> Outcome {
        Outcome::Filter(FilterFragment::fixed(TicketField::ClosedAt, Operator::Ne, Value::Empty))
    }

    fn context() -> Context {
        Context {
            reference_time: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(14, 30, 0).unwrap(),
            caller: Some(Caller { id: 2, name: "Mitchell Admin".to_string() }),
        }
    }

    #[test]
    fn conflict_names_both_terms() {
        let err = resolve_hits(
            &context(),
            &Config::default(),
            vec![hit("open", Category::Status, open()), hit("closed", Category::Status, closed())],
        )
        .unwrap_err();
        match err {
            QueryError::Ambiguous { category, terms } => {
                assert_eq!(category, Category::Status);
                assert_eq!(terms, vec!["open", "closed"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn identical_outcome_is_a_duplicate() {
        let res = resolve_hits(
            &context(),
            &Config::default(),
            vec![hit("open", Category::Status, open()), hit("pending", Category::Status, open())],
        )
        .unwrap();
        let statuses: Vec<HitStatus> = res.decisions.iter().map(|(_, s)| *s).collect();
        assert_eq!(statuses, vec![HitStatus::Accepted, HitStatus::Duplicate]);
        assert_eq!(res.spec.criteria().len(), 1);
    }

    #[test]
    fn claim_suppresses_later_hits() {
        let my = Outcome::Filter(FilterFragment::caller(TicketField::Assignee));
        let res = resolve_hits(
            &context(),
            &Config::default(),
            vec![hit("all", Category::Ownership, Outcome::Claim), hit("my", Category::Ownership, my)],
        )
        .unwrap();
        assert_eq!(res.decisions[1].1, HitStatus::Suppressed);
        assert!(res.spec.criteria().is_empty());
    }

    #[test]
    fn resolves_relative_and_caller_values() {
        let since = Outcome::Filter(FilterFragment::relative(
            TicketField::UpdatedAt,
            Operator::Ge,
            TimeAnchor::StartOf(Grain::Week),
        ));
        let my = Outcome::Filter(FilterFragment::caller(TicketField::Assignee));
        let res = resolve_hits(
            &context(),
            &Config::default(),
            vec![hit("my", Category::Ownership, my), hit("this week", Category::Time, since)],
        )
        .unwrap();

        assert_eq!(res.spec.criterion(Category::Ownership).unwrap().value, Value::Integer(2));
        assert_eq!(
            res.spec.criterion(Category::Time).unwrap().value,
            Value::Timestamp(NaiveDate::from_ymd_opt(2024, 5, 13).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn caller_placeholder_without_caller_fails() {
        let my = Outcome::Filter(FilterFragment::caller(TicketField::Assignee));
        let ctx = Context { caller: None, ..context() };
        let err = resolve_hits(&ctx, &Config::default(), vec![hit("my", Category::Ownership, my)]).unwrap_err();
        assert!(matches!(err, QueryError::Validation(ValidationError::MissingCaller)));
    }
}
