//! Backend sessions.
//!
//! ```text
//!            open()               search() -> Session error
//!  Closed ───────────▶ Open{uid} ─────────────────────────┐
//!    ▲                   │  ▲                             │
//!    │     close()       │  └──── reauthenticate() ◀──────┘
//!    └───────────────────┘            (once per search)
//! ```

use super::{BackendError, TicketRecord, TicketSearch};
use crate::QuerySpec;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Login data for one backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The wire-level calls a backend offers.
pub trait Connector {
    /// Log in and return the backend's user id for `credentials`.
    fn authenticate(&self, credentials: &Credentials) -> Result<i64, BackendError>;

    /// Run a read-only search as `uid`.
    fn search_read(
        &self,
        uid: i64,
        credentials: &Credentials,
        spec: &QuerySpec,
    ) -> Result<Vec<TicketRecord>, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open { uid: i64 },
}

/// An explicit session with one backend.
#[derive(Debug)]
pub struct BackendSession<C> {
    connector: C,
    credentials: Credentials,
    state: SessionState,
}

impl<C: Connector> BackendSession<C> {
    /// A closed session; nothing is sent until [`open`](Self::open) or a search.
    pub fn new(connector: C, credentials: Credentials) -> Self {
        BackendSession { connector, credentials, state: SessionState::Closed }
    }

    pub fn open(&mut self) -> Result<i64, BackendError> {
        let uid = self.connector.authenticate(&self.credentials)?;
        info!(username = %self.credentials.username, uid, "backend session opened");
        self.state = SessionState::Open { uid };
        Ok(uid)
    }

    /// Reuse the open session, or open one.
    pub fn ensure_open(&mut self) -> Result<i64, BackendError> {
        match self.state {
            SessionState::Open { uid } => Ok(uid),
            SessionState::Closed => self.open(),
        }
    }

    pub fn reauthenticate(&mut self) -> Result<i64, BackendError> {
        self.state = SessionState::Closed;
        self.open()
    }

    pub fn close(&mut self) {
        if let SessionState::Open { uid } = self.state {
            debug!(uid, "backend session closed");
        }
        self.state = SessionState::Closed;
    }

    pub fn uid(&self) -> Option<i64> {
        match self.state {
            SessionState::Open { uid } => Some(uid),
            SessionState::Closed => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Search, re-authenticating once if the backend dropped the session.
    pub fn search(&mut self, spec: &QuerySpec) -> Result<Vec<TicketRecord>, BackendError> {
        let uid = self.ensure_open()?;
        match self.connector.search_read(uid, &self.credentials, spec) {
            Err(BackendError::Session(reason)) => {
                warn!(uid, %reason, "backend session expired; re-authenticating");
                let uid = self.reauthenticate()?;
                self.connector.search_read(uid, &self.credentials, spec)
            }
            other => other,
        }
    }
}

/// [`TicketSearch`] over a shared [`BackendSession`].
#[derive(Debug)]
pub struct SessionSearch<C> {
    session: Mutex<BackendSession<C>>,
}

impl<C: Connector> SessionSearch<C> {
    pub fn new(session: BackendSession<C>) -> Self {
        SessionSearch { session: Mutex::new(session) }
    }

    pub fn into_inner(self) -> Result<BackendSession<C>, BackendError> {
        self.session.into_inner().map_err(|_| BackendError::Unavailable("session lock poisoned".to_string()))
    }
}

impl<C: Connector> TicketSearch for SessionSearch<C> {
    fn search(&self, spec: &QuerySpec) -> Result<Vec<TicketRecord>, BackendError> {
        let mut session =
            self.session.lock().map_err(|_| BackendError::Unavailable("session lock poisoned".to_string()))?;
        session.search(spec)
    }
}
