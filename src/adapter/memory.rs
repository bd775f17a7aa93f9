//! In-memory backend.
//!
//! Evaluates a [`QuerySpec`] against a fixed ticket list the way the helpdesk
//! backend would: AND over the criteria, `ilike` as case-insensitive substring,
//! then order and limit.

use super::session::{Connector, Credentials};
use super::{BackendError, TicketRecord, TicketSearch};
use crate::{Direction, FilterCriterion, Operator, QuerySpec, TicketField, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

#[derive(Debug, Clone)]
struct Account {
    username: String,
    password: String,
    uid: i64,
}

#[derive(Debug)]
pub struct MemoryBackend {
    tickets: Vec<TicketRecord>,
    accounts: Vec<Account>,
    available: AtomicBool,
    logins: AtomicUsize,
    /// Uids with a live session.
    sessions: Mutex<BTreeSet<i64>>,
}

impl MemoryBackend {
    pub fn new(tickets: Vec<TicketRecord>) -> Self {
        MemoryBackend {
            tickets,
            accounts: Vec::new(),
            available: AtomicBool::new(true),
            logins: AtomicUsize::new(0),
            sessions: Mutex::new(BTreeSet::new()),
        }
    }

    /// Tickets from a JSON array of [`TicketRecord`]s.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tickets: Vec<TicketRecord> = serde_json::from_str(json)?;
        Ok(Self::new(tickets))
    }

    pub fn with_account(mut self, username: &str, password: &str, uid: i64) -> Self {
        self.accounts.push(Account { username: username.to_string(), password: password.to_string(), uid });
        self
    }

    pub fn tickets(&self) -> &[TicketRecord] {
        &self.tickets
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Drop every live session, as a backend restart would.
    pub fn expire_sessions(&self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.clear();
        }
    }

    /// Number of successful logins so far.
    pub fn logins(&self) -> usize {
        self.logins.load(AtomicOrdering::SeqCst)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("connection refused".to_string()))
        }
    }

    fn evaluate(&self, spec: &QuerySpec) -> Vec<TicketRecord> {
        let mut found: Vec<TicketRecord> =
            self.tickets.iter().filter(|t| spec.criteria().iter().all(|c| matches(t, c))).cloned().collect();

        let order = spec.order();
        found.sort_by(|a, b| {
            let ord = compare(&field_value(a, order.field), &field_value(b, order.field));
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        found.truncate(spec.limit() as usize);
        found
    }
}

impl Connector for MemoryBackend {
    fn authenticate(&self, credentials: &Credentials) -> Result<i64, BackendError> {
        self.check_available()?;
        let account = self
            .accounts
            .iter()
            .find(|a| a.username == credentials.username && a.password == credentials.password)
            .ok_or_else(|| BackendError::Auth(format!("invalid login for {}", credentials.username)))?;

        let mut sessions =
            self.sessions.lock().map_err(|_| BackendError::Unavailable("session table poisoned".to_string()))?;
        sessions.insert(account.uid);
        self.logins.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(account.uid)
    }

    fn search_read(
        &self,
        uid: i64,
        _credentials: &Credentials,
        spec: &QuerySpec,
    ) -> Result<Vec<TicketRecord>, BackendError> {
        self.check_available()?;
        let live = self
            .sessions
            .lock()
            .map_err(|_| BackendError::Unavailable("session table poisoned".to_string()))?
            .contains(&uid);
        if !live {
            return Err(BackendError::Session(format!("no session for uid {uid}")));
        }
        Ok(self.evaluate(spec))
    }
}

/// Direct search, without a session.
impl TicketSearch for MemoryBackend {
    fn search(&self, spec: &QuerySpec) -> Result<Vec<TicketRecord>, BackendError> {
        self.check_available()?;
        Ok(self.evaluate(spec))
    }
}

fn text_or_empty(value: &Option<String>) -> Value {
    value.as_ref().map_or(Value::Empty, |s| Value::Text(s.clone()))
}

fn field_value(ticket: &TicketRecord, field: TicketField) -> Value {
    match field {
        TicketField::Id => Value::Integer(ticket.id),
        TicketField::Title => Value::Text(ticket.title.clone()),
        TicketField::Assignee => ticket.assignee_id.map_or(Value::Empty, Value::Integer),
        TicketField::Customer => text_or_empty(&ticket.customer),
        TicketField::Project => text_or_empty(&ticket.project),
        TicketField::Stage => text_or_empty(&ticket.stage),
        TicketField::Priority => Value::Text(ticket.priority.clone()),
        TicketField::CreatedAt => ticket.created_at.map_or(Value::Empty, Value::Timestamp),
        TicketField::UpdatedAt => ticket.updated_at.map_or(Value::Empty, Value::Timestamp),
        TicketField::ClosedAt => ticket.closed_at.map_or(Value::Empty, Value::Timestamp),
        TicketField::Description => text_or_empty(&ticket.description),
    }
}

fn matches(ticket: &TicketRecord, criterion: &FilterCriterion) -> bool {
    let actual = field_value(ticket, criterion.field);
    let expected = &criterion.value;
    match criterion.operator {
        Operator::Eq => actual == *expected,
        Operator::Ne => actual != *expected,
        Operator::Ge => comparable(&actual, expected) && compare(&actual, expected) != Ordering::Less,
        Operator::Le => comparable(&actual, expected) && compare(&actual, expected) != Ordering::Greater,
        Operator::ILike => match (&actual, expected) {
            (Value::Text(a), Value::Text(b)) => a.to_lowercase().contains(&b.to_lowercase()),
            _ => false,
        },
        Operator::In => match (&actual, expected) {
            (Value::Text(a), Value::List(items)) => items.contains(a),
            (Value::Integer(n), Value::List(items)) => items.contains(&n.to_string()),
            _ => false,
        },
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Integer(_), Value::Integer(_)) | (Value::Text(_), Value::Text(_)) | (Value::Timestamp(_), Value::Timestamp(_))
    )
}

/// Order within one field. Unset values sort first.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Empty, Value::Empty) => Ordering::Equal,
        (Value::Empty, _) => Ordering::Less,
        (_, Value::Empty) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
