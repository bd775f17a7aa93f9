//! Execution adapter boundary.
//!
//! The translator never talks to a backend. It hands a [`QuerySpec`] to
//! something implementing [`TicketSearch`] and gets ticket records back.
//!
//! - `session.rs`: an explicit backend session (`BackendSession`) over a
//!   `Connector`, and `SessionSearch`, which shares one session between
//!   threads and re-authenticates once when the backend drops it.
//! - `memory.rs`: `MemoryBackend`, a connector over a fixed ticket list that
//!   evaluates specs locally. Used by tests and the CLI.

#[path = "adapter/memory.rs"]
mod memory;
#[path = "adapter/session.rs"]
mod session;

pub use memory::MemoryBackend;
pub use session::{BackendSession, Connector, Credentials, SessionSearch, SessionState};

use crate::QuerySpec;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One helpdesk ticket, restricted to the allow-listed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub closed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_priority() -> String {
    "0".to_string()
}

impl TicketRecord {
    /// Closed tickets carry a close date.
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

/// Backend failure. Auth and availability problems stay distinguishable so a
/// caller can tell "fix your credentials" from "try again later".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected
    #[error("backend authentication failed: {0}")]
    Auth(String),

    /// The backend no longer accepts the session it handed out
    #[error("backend session expired: {0}")]
    Session(String),
}

/// Read-only ticket search.
pub trait TicketSearch {
    fn search(&self, spec: &QuerySpec) -> Result<Vec<TicketRecord>, BackendError>;
}
