//! Caller-facing response shape.
//!
//! `handle_query` is the whole request path: translate, search, enrich. It
//! never fails; errors end up in `QueryResponse::error`.

use crate::adapter::{TicketRecord, TicketSearch};
use crate::api::{Caller, Context, Translator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// A ticket as shown to the user: related records flattened to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketView {
    pub id: i64,
    pub name: String,
    /// First 200 characters.
    pub description: String,
    pub priority: String,
    pub create_date: Option<String>,
    pub write_date: Option<String>,
    pub close_date: Option<String>,
    pub is_closed: bool,
    pub user: String,
    pub customer: String,
    pub project: String,
    pub stage: String,
}

impl From<TicketRecord> for TicketView {
    fn from(record: TicketRecord) -> Self {
        let stamp = |ts: Option<chrono::NaiveDateTime>| ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        TicketView {
            id: record.id,
            is_closed: record.is_closed(),
            name: record.title,
            description: record
                .description
                .map(|d| d.chars().take(DESCRIPTION_PREVIEW_CHARS).collect())
                .unwrap_or_default(),
            priority: record.priority,
            create_date: stamp(record.created_at),
            write_date: stamp(record.updated_at),
            close_date: stamp(record.closed_at),
            user: record.assignee.unwrap_or_else(|| "Unassigned".to_string()),
            customer: record.customer.unwrap_or_else(|| "No Customer".to_string()),
            project: record.project.unwrap_or_else(|| "No Project".to_string()),
            stage: record.stage.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<TicketView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    fn failure(query: &str, error: String) -> Self {
        QueryResponse {
            success: false,
            query: query.to_string(),
            query_summary: None,
            domain: None,
            result_count: None,
            tickets: None,
            error: Some(error),
        }
    }
}

/// Translate `request.query` for `caller`, run it on `backend` and build the
/// response.
pub fn handle_query<S: TicketSearch + ?Sized>(
    translator: &Translator,
    backend: &S,
    request: &QueryRequest,
    caller: Option<&Caller>,
) -> QueryResponse {
    let mut context = Context::default();
    context.caller = caller.cloned();

    let translation = match translator.translate(&request.query, &context) {
        Ok(t) => t,
        Err(err) => {
            warn!(query = %request.query, error = %err, "query rejected");
            return QueryResponse::failure(&request.query, err.to_string());
        }
    };
    info!(query = %request.query, summary = %translation.summary, "query translated");

    match backend.search(&translation.spec) {
        Ok(records) => {
            let tickets: Vec<TicketView> = records.into_iter().map(TicketView::from).collect();
            info!(count = tickets.len(), "query returned tickets");
            QueryResponse {
                success: true,
                query: request.query.clone(),
                query_summary: Some(translation.summary),
                domain: Some(translation.spec.domain()),
                result_count: Some(tickets.len()),
                tickets: Some(tickets),
                error: None,
            }
        }
        Err(err) => {
            warn!(query = %request.query, error = %err, "backend search failed");
            QueryResponse::failure(&request.query, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use serde_json::json;

    fn backend() -> MemoryBackend {
        MemoryBackend::from_json(
            r#"[
                {"id": 1, "title": "VPN down", "assignee": "Mitchell Admin", "assignee_id": 2,
                 "customer": "Euroblaze", "priority": "3", "updated_at": "2024-05-15T09:00:00",
                 "description": "The VPN gateway drops every connection after a few seconds."},
                {"id": 2, "title": "Invoice question", "updated_at": "2024-05-14T09:00:00"}
            ]"#,
        )
        .unwrap()
    }

    fn caller() -> Caller {
        Caller { id: 2, name: "Mitchell Admin".to_string() }
    }

    fn request(query: &str) -> QueryRequest {
        QueryRequest { query: query.to_string() }
    }

    #[test]
    fn success_response_shape() {
        let res = handle_query(&Translator::default(), &backend(), &request("my open tickets"), Some(&caller()));
        assert!(res.success);
        assert_eq!(res.query_summary.as_deref(), Some("Your open tickets (limit: 50)"));
        assert_eq!(res.domain, Some(json!([["user_id", "=", 2], ["close_date", "=", false]])));
        assert_eq!(res.result_count, Some(1));
        assert_eq!(res.error, None);

        let value = serde_json::to_value(&res).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["tickets"][0]["customer"], "Euroblaze");
    }

    #[test]
    fn missing_relations_get_placeholders() {
        let res = handle_query(&Translator::default(), &backend(), &request("all tickets"), None);
        let tickets = res.tickets.unwrap();
        let bare = tickets.iter().find(|t| t.id == 2).unwrap();
        assert_eq!(bare.user, "Unassigned");
        assert_eq!(bare.customer, "No Customer");
        assert_eq!(bare.project, "No Project");
        assert_eq!(bare.stage, "Unknown");
        assert_eq!(bare.description, "");
    }

    #[test]
    fn description_is_truncated() {
        let mut record: TicketRecord = serde_json::from_str(r#"{"id": 1, "title": "x"}"#).unwrap();
        record.description = Some("é".repeat(250));
        let view = TicketView::from(record);
        assert_eq!(view.description.chars().count(), 200);
    }

    #[test]
    fn errors_become_failure_responses() {
        let res = handle_query(&Translator::default(), &backend(), &request("my tickets"), None);
        assert!(!res.success);
        assert!(res.error.unwrap().contains("no caller identity"));
        assert!(res.tickets.is_none());

        let res = handle_query(&Translator::default(), &backend(), &request("open and closed tickets"), None);
        assert!(res.error.unwrap().starts_with("ambiguous query"));

        let down = backend();
        down.set_available(false);
        let res = handle_query(&Translator::default(), &down, &request("open tickets"), None);
        assert_eq!(res.error.as_deref(), Some("backend unavailable: connection refused"));
    }
}
