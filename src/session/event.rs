//! Lifecycle events
//!
//! Emitted once per ingestion run when it terminates. Reconnects that
//! succeed do not produce an event.

use crate::error::SessionError;

/// Terminal lifecycle event of a session run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session stopped on request
    Stopped { session_id: String },

    /// The session terminated with an error
    Error {
        session_id: String,
        cause: SessionError,
        /// Reconnect attempts made before giving up (0 if none)
        reconnect_attempts: u32,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::Stopped { session_id } | SessionEvent::Error { session_id, .. } => {
                session_id
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SessionEvent::Error { .. })
    }
}
