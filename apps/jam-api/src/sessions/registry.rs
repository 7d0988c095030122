//! In-memory session store: creation, lookup, join-request queueing,
//! admission, and teardown.
//!
//! A single `RwLock` guards the whole store, so check-then-act operations
//! like admission against the participant ceiling stay atomic with respect
//! to concurrent connections.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use parking_lot::RwLock;

use jamlink_common::code;

use super::session::{Participant, PublicSession, Session};

/// Why an admission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    /// Session gone, or no matching pending request.
    NotFound,
    /// The session is at its participant ceiling.
    Full,
}

#[derive(Default)]
struct RegistryInner {
    /// All live sessions, keyed by id (== join code).
    sessions: HashMap<String, Session>,
    /// Ids of the sessions that belong in the public listing.
    public_index: HashSet<String>,
}

/// Registry of all live sessions. State and logic only, no I/O; routing the
/// resulting notifications is the relay's job.
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Create a session and index it for public listing if applicable.
    ///
    /// The join code is regenerated until it doesn't collide with an active
    /// session, so a code maps to at most one live session.
    pub fn create_session(
        &self,
        host_connection_id: &str,
        host_display_name: &str,
        is_public: bool,
        max_participants: u32,
    ) -> Session {
        let mut inner = self.inner.write();

        let code = loop {
            let candidate = code::generate_join_code();
            if !inner.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session {
            id: code.clone(),
            code: code.clone(),
            host_connection_id: host_connection_id.to_string(),
            host_display_name: host_display_name.to_string(),
            is_public,
            max_participants: max_participants.max(1),
            participants: HashMap::new(),
            pending_requests: HashMap::new(),
            is_active: true,
            created_at: Utc::now(),
        };

        inner.sessions.insert(code.clone(), session.clone());
        if is_public {
            inner.public_index.insert(code);
        }

        session
    }

    /// Snapshot of a session by id.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.inner.read().sessions.get(session_id).cloned()
    }

    /// Look up a session by join code. Codes are case-normalized on input;
    /// since the code doubles as the session id this is a direct lookup,
    /// behaviorally equivalent to scanning for an exact code match.
    pub fn find_by_code(&self, code: &str) -> Option<Session> {
        self.get(&code::normalize_join_code(code))
    }

    /// Snapshot of the discoverable listing: active public sessions only.
    /// Safe to poll.
    pub fn list_public(&self) -> Vec<PublicSession> {
        let inner = self.inner.read();
        inner
            .public_index
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .filter(|session| session.is_active)
            .map(|session| PublicSession {
                id: session.id.clone(),
                code: session.code.clone(),
                host_name: session.host_display_name.clone(),
                participant_count: session.participants.len(),
                created_at: session.created_at,
            })
            .collect()
    }

    /// Queue a join request. Returns false if the session doesn't exist.
    /// Idempotent per connection id: a re-request overwrites the pending
    /// record.
    pub fn enqueue_join_request(
        &self,
        session_id: &str,
        connection_id: &str,
        display_name: &str,
    ) -> bool {
        let mut inner = self.inner.write();
        let Some(session) = inner.sessions.get_mut(session_id) else {
            return false;
        };
        session.pending_requests.insert(
            connection_id.to_string(),
            Participant {
                connection_id: connection_id.to_string(),
                display_name: display_name.to_string(),
                requested_at: Utc::now(),
            },
        );
        true
    }

    /// Move a pending request into the participant roster.
    ///
    /// The participant ceiling is enforced here, under the registry lock, so
    /// two racing approvals for the last open slot cannot both succeed. On
    /// `Full` the pending record is left in place; the caller decides whether
    /// to drop it.
    pub fn admit_participant(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Result<Participant, AdmitError> {
        let mut inner = self.inner.write();
        let session = inner.sessions.get_mut(session_id).ok_or(AdmitError::NotFound)?;

        if !session.pending_requests.contains_key(connection_id) {
            return Err(AdmitError::NotFound);
        }
        if session.participants.len() >= session.max_participants as usize {
            return Err(AdmitError::Full);
        }

        match session.pending_requests.remove(connection_id) {
            Some(participant) => {
                session
                    .participants
                    .insert(connection_id.to_string(), participant.clone());
                Ok(participant)
            }
            None => Err(AdmitError::NotFound),
        }
    }

    /// Remove a connection from both the pending and participant sets.
    /// Idempotent; no-op when the session or connection is absent. Returns
    /// true when an admitted participant was removed, i.e. the roster
    /// changed.
    pub fn remove_connection(&self, session_id: &str, connection_id: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(session) = inner.sessions.get_mut(session_id) else {
            return false;
        };
        session.pending_requests.remove(connection_id);
        session.participants.remove(connection_id).is_some()
    }

    /// Tear a session down entirely: it is removed from the store and the
    /// public index, and is unreachable by code or id afterwards. Idempotent.
    /// Returns the final snapshot so the caller can notify the members that
    /// were still present.
    pub fn destroy_session(&self, session_id: &str) -> Option<Session> {
        let mut inner = self.inner.write();
        inner.public_index.remove(session_id);
        inner.sessions.remove(session_id)
    }

    /// Ordered roster snapshot of a session's admitted participants.
    pub fn roster(&self, session_id: &str) -> Option<Vec<Participant>> {
        self.inner
            .read()
            .sessions
            .get(session_id)
            .map(Session::roster)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
