//! Live source to HLS session manager
//!
//! Pulls live sources (typically RTSP cameras) through a pluggable transport,
//! cuts the stream into keyframe-aligned segments held in a small in-memory
//! window, and serves HLS playlists and segment bytes on demand.
//!
//! Opening the same source address twice shares one ingestion session. Each
//! session runs a single worker task that reconnects when the source drops
//! and gives up when no keyframe arrives within the watchdog window.
//!
//! The crate does not speak RTSP or write MPEG-TS itself: plug in a
//! [`Transport`] and a [`Muxer`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rtsp_hls::SessionRegistry;
//!
//! let registry = Arc::new(SessionRegistry::new(Arc::new(transport), Arc::new(muxer)));
//!
//! let session = registry.open("rtsp://10.0.0.7:554/stream1").await?;
//! let playlist = session.playlist(&format!("/hls/{}/", session.id())).await?;
//! let bytes = session.segment("7.ts")?;
//! ```

pub mod error;
pub mod hls;
pub mod media;
pub mod mux;
pub mod registry;
pub mod session;
pub mod stats;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, PlaylistError, Result, SegmentError, SessionError};
pub use media::{Codec, CodecData, CodecDescription, MediaKind, MediaUnit};
pub use mux::{MuxError, MuxStage, Muxer, SegmentWriter};
pub use registry::{RegistryConfig, RegistryError, SessionRegistry};
pub use session::{Session, SessionConfig, SessionEvent, SessionInfo, SessionState, SessionStatus};
pub use stats::SessionStats;
pub use transport::{
    ConnectOptions, Connection, ControlSignal, Transport, TransportError, TransportEvent,
};
