//! Wire event names and payload shapes for the signaling protocol.
//!
//! Frames in both directions are a JSON envelope `{event, data}`; payload
//! fields are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Wire event names, client → server and server → client.
pub struct EventName;

impl EventName {
    // Client → server.
    pub const CREATE_SESSION: &'static str = "create-session";
    pub const JOIN_REQUEST: &'static str = "join-request";
    pub const APPROVE_USER: &'static str = "approve-user";
    pub const WEBRTC_OFFER: &'static str = "webrtc-offer";
    pub const WEBRTC_ANSWER: &'static str = "webrtc-answer";
    pub const ICE_CANDIDATE: &'static str = "ice-candidate";
    pub const START_STREAMING: &'static str = "start-streaming";
    pub const STOP_STREAMING: &'static str = "stop-streaming";

    // Server → client. The three negotiation relays above are echoed back
    // under their inbound names, tagged with the sender.
    pub const SESSION_CREATED: &'static str = "session-created";
    pub const PENDING_REQUEST: &'static str = "pending-request";
    pub const JOIN_PENDING: &'static str = "join-pending";
    pub const JOIN_APPROVED: &'static str = "join-approved";
    pub const JOIN_DECLINED: &'static str = "join-declined";
    pub const JOIN_ERROR: &'static str = "join-error";
    pub const PARTICIPANT_UPDATED: &'static str = "participant-updated";
    pub const PUBLIC_SESSIONS_UPDATED: &'static str = "public-sessions-updated";
    pub const SESSION_ENDED: &'static str = "session-ended";
    pub const HOST_STREAMING_STARTED: &'static str = "host-streaming-started";
    pub const HOST_STREAMING_STOPPED: &'static str = "host-streaming-stopped";
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// A frame received from a client.
#[derive(Debug, Deserialize)]
pub struct ClientEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A frame sent to a client.
#[derive(Debug, Serialize)]
pub struct ServerEvent<'a> {
    pub event: &'a str,
    pub data: &'a Value,
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub host_name: String,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
    /// Optional participant ceiling; the configured default applies when
    /// absent.
    #[serde(default)]
    pub max_participants: Option<u32>,
}

fn default_is_public() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestPayload {
    pub session_code: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveUserPayload {
    pub user_id: String,
    pub approve: bool,
}
