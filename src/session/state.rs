//! Session state machine
//!
//! ```text
//! Idle ──► Connecting ──► Running ──► Stopping ──► Stopped
//!  ▲           │  ▲          │                       │
//!  └─(failed)──┘  └─reconnect┘──► Errored            │
//!                 ◄──────────── restart ─────────────┘
//! ```

use std::fmt;

use crate::error::SessionError;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, never started
    Idle,
    /// Dialing the source (first start or reconnect)
    Connecting,
    /// Ingestion loop running
    Running,
    /// Stop requested, loop shutting down
    Stopping,
    /// Stopped on request or by the source
    Stopped,
    /// Terminated by an error
    Errored,
}

impl SessionState {
    /// Connecting or running
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Running)
    }

    /// The ingestion loop has ended (or never ran)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::Stopped | SessionState::Errored
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Observable status of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub last_error: Option<SessionError>,
    /// Current reconnect attempt (0 when not reconnecting)
    pub reconnect_attempts: u32,
}

impl SessionStatus {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_error: None,
            reconnect_attempts: 0,
        }
    }

    /// Begin dialing. Clears the last error and returns the state to restore
    /// if the dial fails.
    pub fn begin_connect(&mut self) -> SessionState {
        let previous = self.state;
        self.state = SessionState::Connecting;
        self.last_error = None;
        previous
    }

    /// Dial failed
    pub fn connect_failed(&mut self, restore: SessionState, error: SessionError) {
        self.state = restore;
        self.last_error = Some(error);
    }

    /// Connected, loop about to run
    pub fn connected(&mut self) {
        self.state = SessionState::Running;
        self.reconnect_attempts = 0;
    }

    /// Source went away, reconnect attempt `attempt` pending
    pub fn reconnecting(&mut self, attempt: u32) {
        self.state = SessionState::Connecting;
        self.reconnect_attempts = attempt;
    }

    /// Stop requested. Returns false if the session was not live.
    pub fn begin_stop(&mut self) -> bool {
        if self.state.is_live() {
            self.state = SessionState::Stopping;
            true
        } else {
            false
        }
    }

    pub fn stopped(&mut self) {
        self.state = SessionState::Stopped;
    }

    pub fn errored(&mut self, error: SessionError) {
        self.state = SessionState::Errored;
        self.last_error = Some(error);
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}
