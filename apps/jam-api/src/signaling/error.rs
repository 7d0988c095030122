//! Signaling failure taxonomy.

/// Why a signaling request was rejected. All variants are recoverable: they
/// surface to the originating connection as a `join-error` event and never
/// take the process down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// No active session matches the supplied code.
    SessionNotFound,
    /// The session is at its participant ceiling.
    SessionFull,
    /// A host-only action was attempted by a non-host connection.
    NotHost,
    /// The connection already hosts a live session.
    AlreadyHosting,
}

impl SignalError {
    /// Human-readable reason carried by `join-error{message}`.
    pub fn message(self) -> &'static str {
        match self {
            SignalError::SessionNotFound => "Session not found",
            SignalError::SessionFull => "Session is full",
            SignalError::NotHost => "Not the session host",
            SignalError::AlreadyHosting => "Already hosting a session",
        }
    }
}
