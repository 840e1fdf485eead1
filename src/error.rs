//! Error types
//!
//! Each area returns its own error enum; `Error` wraps all of them for
//! callers that just want `?` to work across the API.

use std::fmt;
use std::time::Duration;

use crate::mux::MuxStage;
use crate::registry::RegistryError;
use crate::transport::TransportError;

/// Result alias using the crate-wide error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error
#[derive(Debug)]
pub enum Error {
    Session(SessionError),
    Segment(SegmentError),
    Playlist(PlaylistError),
    Registry(RegistryError),
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Session(e) => write!(f, "session error: {}", e),
            Error::Segment(e) => write!(f, "segment error: {}", e),
            Error::Playlist(e) => write!(f, "playlist error: {}", e),
            Error::Registry(e) => write!(f, "registry error: {}", e),
            Error::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Session(e) => Some(e),
            Error::Segment(e) => Some(e),
            Error::Playlist(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Transport(e) => Some(e),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Error::Session(e)
    }
}

impl From<SegmentError> for Error {
    fn from(e: SegmentError) -> Self {
        Error::Segment(e)
    }
}

impl From<PlaylistError> for Error {
    fn from(e: PlaylistError) -> Self {
        Error::Playlist(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

/// Session lifecycle errors
///
/// Recorded as the session's last error and carried by lifecycle events,
/// hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Dialing or negotiating with the source failed
    ConnectFailure { reason: String },
    /// No keyframe arrived within the watchdog window
    StallTimeout { window: Duration },
    /// The source closed the stream
    PeerDisconnect,
    /// Stop requested on a session that is not running
    NotStarted,
    /// The ingestion worker failed unexpectedly
    Internal(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConnectFailure { reason } => write!(f, "connect failed: {}", reason),
            SessionError::StallTimeout { window } => write!(
                f,
                "stream stopped because no video received within {}s",
                window.as_secs_f64()
            ),
            SessionError::PeerDisconnect => write!(f, "source stopped the stream"),
            SessionError::NotStarted => write!(f, "stream is not started"),
            SessionError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

/// Segment materialization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The requested name is not `<sequence>[.ts]`
    InvalidName(String),
    /// The sequence is not (or no longer) retained
    NotFound(u64),
    /// The segment holds no units
    Empty(u64),
    /// The muxer failed while writing
    MuxWriteFailure {
        sequence: u64,
        stage: MuxStage,
        reason: String,
    },
    /// The muxer panicked
    MuxerPanicked(u64),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::InvalidName(name) => write!(f, "invalid segment name: {:?}", name),
            SegmentError::NotFound(seq) => write!(f, "segment not exist: {}", seq),
            SegmentError::Empty(seq) => write!(f, "empty segment: {}", seq),
            SegmentError::MuxWriteFailure {
                sequence,
                stage,
                reason,
            } => write!(f, "segment {}: {} write failed: {}", sequence, stage, reason),
            SegmentError::MuxerPanicked(seq) => write!(f, "segment {}: muxer panicked", seq),
        }
    }
}

impl std::error::Error for SegmentError {}

/// Playlist rendering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistError {
    /// No segment became available within the wait bound
    NotReady,
}

impl fmt::Display for PlaylistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistError::NotReady => write!(f, "no segment available yet"),
        }
    }
}

impl std::error::Error for PlaylistError {}
