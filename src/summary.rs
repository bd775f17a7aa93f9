use crate::config::Config;
use crate::query_spec::QuerySpec;
use crate::{Category, Operator, Value};

/// One-line description of `spec`, e.g. `"Your open tickets (limit: 50)"`.
///
/// Pure function of the spec (the config only supplies priority labels and
/// the max limit); used for display, never for behavior.
pub fn summarize(spec: &QuerySpec, config: &Config) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(if spec.criterion(Category::Ownership).is_some() { "your" } else { "all" }.to_string());

    if let Some(status) = spec.criterion(Category::Status) {
        match (status.operator, &status.value) {
            (Operator::Eq, Value::Empty) => parts.push("open".to_string()),
            (Operator::Ne, Value::Empty) => parts.push("closed".to_string()),
            _ => parts.push(format!("status {status}")),
        }
    }

    if let Some(priority) = spec.criterion(Category::Priority) {
        let label = match &priority.value {
            Value::List(codes) => config.priority.label_for(codes).map(str::to_string),
            _ => None,
        };
        match label {
            Some(label) => parts.push(format!("{label} priority")),
            None => parts.push(format!("priority {}", priority.value)),
        }
    }

    parts.push("tickets".to_string());

    if let Some(customer) = spec.criterion(Category::Customer) {
        parts.push(format!("for customer matching {}", customer.value));
    }

    if let Some(project) = spec.criterion(Category::Project) {
        parts.push(format!("in project matching {}", project.value));
    }

    if let Some(time) = spec.criterion(Category::Time) {
        match &time.value {
            Value::Timestamp(ts) => parts.push(format!("since {}", ts.format("%Y-%m-%d"))),
            other => parts.push(format!("since {other}")),
        }
    }

    let mut result = parts.join(" ");
    if spec.limit() < config.max_limit {
        result.push_str(&format!(" (limit: {})", spec.limit()));
    }

    capitalize(&result)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_spec::{FilterCriterion, QuerySpecBuilder};
    use crate::TicketField;
    use chrono::NaiveDate;

    #[test]
    fn plain_default_view() {
        let config = Config::default();
        let spec = QuerySpecBuilder::new(&config).build();
        assert_eq!(summarize(&spec, &config), "All tickets (limit: 50)");
    }

    #[test]
    fn full_sentence_in_fixed_order() {
        let config = Config::default();
        let since = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut b = QuerySpecBuilder::new(&config);
        b.criterion(FilterCriterion {
            category: Category::Time,
            field: TicketField::UpdatedAt,
            operator: Operator::Ge,
            value: Value::Timestamp(since),
        })
        .criterion(FilterCriterion {
            category: Category::Customer,
            field: TicketField::Customer,
            operator: Operator::ILike,
            value: Value::Text("euroblaze".to_string()),
        })
        .criterion(FilterCriterion {
            category: Category::Priority,
            field: TicketField::Priority,
            operator: Operator::In,
            value: Value::List(config.priority.high.clone()),
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
        })
        .limit(100);

        assert_eq!(
            summarize(&b.build(), &config),
            "Your closed high priority tickets for customer matching 'euroblaze' since 2024-05-15"
        );
    }

    #[test]
    fn unknown_priority_codes_are_listed() {
        let config = Config::default();
        let mut b = QuerySpecBuilder::new(&config);
        b.criterion(FilterCriterion {
            category: Category::Priority,
            field: TicketField::Priority,
            operator: Operator::In,
            value: Value::List(vec!["7".to_string()]),
        });
        assert_eq!(summarize(&b.build(), &config), "All priority [7] tickets (limit: 50)");
    }
}
