//! The signaling event-routing matrix: binds inbound connection events to
//! registry operations and routes the resulting notifications.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::sessions::registry::{AdmitError, SessionRegistry};

use super::error::SignalError;
use super::events::{ApproveUserPayload, CreateSessionPayload, EventName, JoinRequestPayload};
use super::fanout::{Recipient, SignalingBroadcast};

/// Role a connection plays within its associated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the session; sole authority over admissions.
    Host,
    /// Join request queued, awaiting the host's decision. Not yet part of
    /// the multicast group.
    Pending,
    /// Admitted guest; part of the multicast group.
    Participant,
}

/// A connection's transient session association. Created when the connection
/// hosts or requests to join a session, cleared on disconnect.
#[derive(Debug, Clone)]
struct Association {
    session_id: String,
    role: Role,
}

/// Translates connection-scoped events into registry operations and outbound
/// messages.
///
/// Handlers that touch shared state hold the association lock for their full
/// duration, so every check-then-act sequence runs single-writer even on a
/// multi-threaded runtime.
pub struct SignalingRelay {
    registry: Arc<SessionRegistry>,
    broadcast: SignalingBroadcast,
    default_max_participants: u32,
    connections: Mutex<HashMap<String, Association>>,
}

impl SignalingRelay {
    pub fn new(
        registry: Arc<SessionRegistry>,
        broadcast: SignalingBroadcast,
        default_max_participants: u32,
    ) -> Self {
        Self {
            registry,
            broadcast,
            default_max_participants,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch one inbound event from `connection_id`. Unknown events and
    /// malformed payloads are logged and dropped; nothing here is fatal.
    pub fn handle_event(&self, connection_id: &str, event: &str, data: Value) {
        match event {
            EventName::CREATE_SESSION => {
                if let Some(payload) = parse_payload(connection_id, event, data) {
                    self.on_create_session(connection_id, payload);
                }
            }
            EventName::JOIN_REQUEST => {
                if let Some(payload) = parse_payload(connection_id, event, data) {
                    self.on_join_request(connection_id, payload);
                }
            }
            EventName::APPROVE_USER => {
                if let Some(payload) = parse_payload(connection_id, event, data) {
                    self.on_approve_user(connection_id, payload);
                }
            }
            EventName::WEBRTC_OFFER => self.on_signal(connection_id, EventName::WEBRTC_OFFER, data),
            EventName::WEBRTC_ANSWER => {
                self.on_signal(connection_id, EventName::WEBRTC_ANSWER, data)
            }
            EventName::ICE_CANDIDATE => {
                self.on_signal(connection_id, EventName::ICE_CANDIDATE, data)
            }
            EventName::START_STREAMING => {
                self.on_streaming(connection_id, EventName::HOST_STREAMING_STARTED)
            }
            EventName::STOP_STREAMING => {
                self.on_streaming(connection_id, EventName::HOST_STREAMING_STOPPED)
            }
            other => {
                tracing::debug!(connection_id, event = other, "ignoring unknown event");
            }
        }
    }

    /// Apply the disconnect state machine: hosts take their session down with
    /// them, guests leave their roster, unassociated connections are a no-op.
    pub fn handle_disconnect(&self, connection_id: &str) {
        let mut conns = self.connections.lock();
        self.leave_current(&mut conns, connection_id);
    }

    // -----------------------------------------------------------------------
    // Inbound event handlers
    // -----------------------------------------------------------------------

    fn on_create_session(&self, connection_id: &str, payload: CreateSessionPayload) {
        let mut conns = self.connections.lock();

        // A connection drives at most one session at a time: a host creating
        // again implicitly tears the old session down, a guest leaves its
        // roster first.
        self.leave_current(&mut conns, connection_id);

        let max_participants = payload
            .max_participants
            .unwrap_or(self.default_max_participants);
        let session = self.registry.create_session(
            connection_id,
            &display_name(&payload.host_name),
            payload.is_public,
            max_participants,
        );
        conns.insert(
            connection_id.to_string(),
            Association {
                session_id: session.id.clone(),
                role: Role::Host,
            },
        );

        tracing::info!(
            connection_id,
            session_code = %session.code,
            is_public = session.is_public,
            "session created"
        );

        self.broadcast.send(
            Recipient::One(connection_id.to_string()),
            EventName::SESSION_CREATED,
            json!({
                "sessionId": session.id,
                "sessionCode": session.code,
                "isPublic": session.is_public,
            }),
        );
        self.broadcast_public_sessions();
    }

    fn on_join_request(&self, connection_id: &str, payload: JoinRequestPayload) {
        let mut conns = self.connections.lock();

        // Hosts keep their session; they cannot also join another one.
        if conns
            .get(connection_id)
            .is_some_and(|assoc| assoc.role == Role::Host)
        {
            self.reject(connection_id, SignalError::AlreadyHosting);
            return;
        }

        let Some(session) = self.registry.find_by_code(&payload.session_code) else {
            self.reject(connection_id, SignalError::SessionNotFound);
            return;
        };
        if session.participants.len() >= session.max_participants as usize {
            self.reject(connection_id, SignalError::SessionFull);
            return;
        }

        // A connection belongs to at most one session. A repeat request to
        // the same session refreshes the pending record; anything else
        // migrates the connection out of its previous session first.
        if let Some(assoc) = conns.get(connection_id).cloned() {
            if assoc.session_id == session.id && assoc.role == Role::Participant {
                return;
            }
            if assoc.session_id != session.id {
                self.leave_current(&mut conns, connection_id);
            }
        }

        let user_name = display_name(&payload.user_name);
        if !self
            .registry
            .enqueue_join_request(&session.id, connection_id, &user_name)
        {
            self.reject(connection_id, SignalError::SessionNotFound);
            return;
        }
        conns.insert(
            connection_id.to_string(),
            Association {
                session_id: session.id.clone(),
                role: Role::Pending,
            },
        );

        tracing::debug!(connection_id, session_code = %session.code, "join request queued");

        self.broadcast.send(
            Recipient::One(session.host_connection_id.clone()),
            EventName::PENDING_REQUEST,
            json!({ "userId": connection_id, "userName": user_name }),
        );
        self.broadcast.send(
            Recipient::One(connection_id.to_string()),
            EventName::JOIN_PENDING,
            json!({ "sessionId": session.id }),
        );
    }

    fn on_approve_user(&self, connection_id: &str, payload: ApproveUserPayload) {
        let mut conns = self.connections.lock();

        let session_id = match conns.get(connection_id) {
            Some(assoc) if assoc.role == Role::Host => assoc.session_id.clone(),
            _ => {
                self.reject(connection_id, SignalError::NotHost);
                return;
            }
        };
        let target = payload.user_id.as_str();

        if !payload.approve {
            self.registry.remove_connection(&session_id, target);
            if conns
                .get(target)
                .is_some_and(|assoc| assoc.session_id == session_id)
            {
                conns.remove(target);
            }
            self.broadcast.send(
                Recipient::One(target.to_string()),
                EventName::JOIN_DECLINED,
                json!({}),
            );
            return;
        }

        match self.registry.admit_participant(&session_id, target) {
            Ok(participant) => {
                conns.insert(
                    target.to_string(),
                    Association {
                        session_id: session_id.clone(),
                        role: Role::Participant,
                    },
                );
                tracing::info!(
                    connection_id,
                    target,
                    user_name = %participant.display_name,
                    session_code = %session_id,
                    "participant admitted"
                );
                if let Some(session) = self.registry.get(&session_id) {
                    self.broadcast.send(
                        Recipient::One(target.to_string()),
                        EventName::JOIN_APPROVED,
                        json!({
                            "sessionId": session.id,
                            "hostName": session.host_display_name,
                        }),
                    );
                    self.broadcast_roster(&session);
                }
            }
            Err(AdmitError::Full) => {
                // The last slot filled before this approval landed. Drop the
                // request and tell the guest.
                self.registry.remove_connection(&session_id, target);
                conns.remove(target);
                self.reject(target, SignalError::SessionFull);
            }
            Err(AdmitError::NotFound) => {
                // Requester already vanished, or was never pending.
                tracing::debug!(connection_id, target, "approval target not pending");
            }
        }
    }

    /// Forward a negotiation payload verbatim to its target, tagged with the
    /// sender. No existence check on the target: delivery to a vanished
    /// connection is a silent no-op.
    fn on_signal(&self, connection_id: &str, event: &'static str, data: Value) {
        let Value::Object(mut fields) = data else {
            tracing::debug!(connection_id, event, "malformed signal payload");
            return;
        };
        let target = match fields.remove("target") {
            Some(Value::String(target)) => target,
            _ => {
                tracing::debug!(connection_id, event, "signal payload without target");
                return;
            }
        };
        fields.insert("sender".to_string(), Value::String(connection_id.to_string()));

        self.broadcast
            .send(Recipient::One(target), event, Value::Object(fields));
    }

    /// Notify the rest of the caller's multicast group of a streaming state
    /// change. No-op for unassociated and still-pending connections.
    fn on_streaming(&self, connection_id: &str, event: &'static str) {
        let conns = self.connections.lock();
        let Some(assoc) = conns.get(connection_id) else {
            return;
        };
        if assoc.role == Role::Pending {
            return;
        }
        let Some(session) = self.registry.get(&assoc.session_id) else {
            return;
        };

        let recipients: Vec<String> = session
            .member_connection_ids()
            .into_iter()
            .filter(|id| id != connection_id)
            .collect();
        if recipients.is_empty() {
            return;
        }
        self.broadcast
            .send(Recipient::Many(recipients), event, json!({}));
    }

    // -----------------------------------------------------------------------
    // Shared transitions
    // -----------------------------------------------------------------------

    /// Detach a connection from whatever session it is associated with,
    /// cascading the appropriate notifications. No-op when unassociated.
    fn leave_current(&self, conns: &mut HashMap<String, Association>, connection_id: &str) {
        let Some(assoc) = conns.remove(connection_id) else {
            return;
        };
        match assoc.role {
            Role::Host => self.teardown_session(conns, &assoc.session_id),
            Role::Pending | Role::Participant => {
                let roster_changed = self
                    .registry
                    .remove_connection(&assoc.session_id, connection_id);
                if roster_changed {
                    if let Some(session) = self.registry.get(&assoc.session_id) {
                        self.broadcast_roster(&session);
                    }
                }
            }
        }
    }

    /// Destroy a hosted session. Admitted participants get one
    /// `session-ended` each; member associations are erased and the public
    /// listing refreshed for everyone.
    fn teardown_session(&self, conns: &mut HashMap<String, Association>, session_id: &str) {
        let Some(session) = self.registry.destroy_session(session_id) else {
            return;
        };

        let members: Vec<String> = session.participants.keys().cloned().collect();
        for connection_id in members.iter().chain(session.pending_requests.keys()) {
            conns.remove(connection_id);
        }
        if !members.is_empty() {
            self.broadcast
                .send(Recipient::Many(members), EventName::SESSION_ENDED, json!({}));
        }

        tracing::info!(session_code = %session.code, "session ended");
        self.broadcast_public_sessions();
    }

    /// Push the current roster to the session's multicast group.
    fn broadcast_roster(&self, session: &crate::sessions::session::Session) {
        self.broadcast.send(
            Recipient::Many(session.member_connection_ids()),
            EventName::PARTICIPANT_UPDATED,
            json!({ "participants": session.roster() }),
        );
    }

    /// Push the full public listing to every connected client.
    fn broadcast_public_sessions(&self) {
        self.broadcast.send(
            Recipient::All,
            EventName::PUBLIC_SESSIONS_UPDATED,
            json!({ "sessions": self.registry.list_public() }),
        );
    }

    /// Surface a recoverable failure to the originating connection.
    fn reject(&self, connection_id: &str, error: SignalError) {
        tracing::debug!(connection_id, ?error, "signaling request rejected");
        self.broadcast.send(
            Recipient::One(connection_id.to_string()),
            EventName::JOIN_ERROR,
            json!({ "message": error.message() }),
        );
    }
}

fn parse_payload<T: DeserializeOwned>(connection_id: &str, event: &str, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::debug!(connection_id, event, %err, "malformed payload");
            None
        }
    }
}

/// Display names are free-form but never empty once stored.
fn display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed.to_string()
    }
}
