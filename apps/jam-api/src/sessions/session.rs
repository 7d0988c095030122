//! Session and participant data types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A hosted audio session, identified by its shareable join code.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier. The join code doubles as the id.
    pub id: String,
    /// Human-shareable join code: 6 uppercase alphanumeric characters.
    pub code: String,
    /// Connection that created the session. Immutable for the session's
    /// lifetime; when it goes away, the session goes with it.
    pub host_connection_id: String,
    /// Display name chosen by the host. Free-form, not validated for
    /// uniqueness.
    pub host_display_name: String,
    /// Whether the session appears in the public listing.
    pub is_public: bool,
    /// Ceiling on concurrently admitted participants.
    pub max_participants: u32,
    /// Admitted guests, keyed by connection id.
    pub participants: HashMap<String, Participant>,
    /// Join requests awaiting a host decision, keyed by connection id.
    /// Disjoint from `participants` at all times.
    pub pending_requests: HashMap<String, Participant>,
    /// Alive flag. Equivalent to registry presence today; kept on the record
    /// so listing snapshots can filter without a second lookup.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Connection ids of the session's multicast group: the host plus every
    /// admitted participant. Pending requesters are not part of the group.
    pub fn member_connection_ids(&self) -> Vec<String> {
        let mut ids = Vec::with_capacity(self.participants.len() + 1);
        ids.push(self.host_connection_id.clone());
        ids.extend(self.participants.keys().cloned());
        ids
    }

    /// Roster snapshot of admitted participants, ordered by admission request
    /// time for stable display.
    pub fn roster(&self) -> Vec<Participant> {
        let mut roster: Vec<Participant> = self.participants.values().cloned().collect();
        roster.sort_by(|a, b| {
            a.requested_at
                .cmp(&b.requested_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        roster
    }
}

/// A guest record. The same shape serves pending requests and admitted
/// participants; admission moves the record between the two maps rather than
/// copying it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Participant {
    #[serde(rename = "userId")]
    pub connection_id: String,
    #[serde(rename = "userName")]
    pub display_name: String,
    #[serde(rename = "timestamp")]
    pub requested_at: DateTime<Utc>,
}

/// Public-listing entry, served by the discovery endpoint and pushed in
/// `public-sessions-updated` broadcasts.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicSession {
    pub id: String,
    pub code: String,
    pub host_name: String,
    pub participant_count: usize,
    pub created_at: DateTime<Utc>,
}
