//! Decoded media units and codec descriptions
//!
//! A media unit is one demuxed access unit as handed over by the transport:
//! the payload bytes, a presentation timestamp relative to the start of the
//! source session and a keyframe flag.
//!
//! ```text
//! +-------+-----------+-------------+------------------+----------+
//! | kind  | timestamp | comp. time  | keyframe (video) | payload  |
//! +-------+-----------+-------------+------------------+----------+
//! ```
//!
//! Payloads are `Bytes`, so cloning a unit (e.g. to normalize metadata before
//! muxing) never copies media data.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

/// Elementary stream kind of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

/// A single decoded media unit
#[derive(Debug, Clone)]
pub struct MediaUnit {
    /// Stream kind
    pub kind: MediaKind,
    /// Raw payload (access unit, no container framing)
    pub payload: Bytes,
    /// Presentation timestamp
    pub timestamp: Duration,
    /// Composition time offset as reported by the source
    pub composition_time: Duration,
    /// Whether this unit can start independent decoding (video only)
    pub is_keyframe: bool,
}

impl MediaUnit {
    /// Create a video unit
    pub fn video(timestamp: Duration, payload: Bytes, is_keyframe: bool) -> Self {
        Self {
            kind: MediaKind::Video,
            payload,
            timestamp,
            composition_time: Duration::ZERO,
            is_keyframe,
        }
    }

    /// Create an audio unit
    pub fn audio(timestamp: Duration, payload: Bytes) -> Self {
        Self {
            kind: MediaKind::Audio,
            payload,
            timestamp,
            composition_time: Duration::ZERO,
            is_keyframe: false,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }

    /// Keyframes only count for video; an audio unit flagged as keyframe is ignored.
    pub fn is_video_keyframe(&self) -> bool {
        self.is_video() && self.is_keyframe
    }

    /// Copy of this unit with the composition time replaced
    pub fn with_composition_time(&self, composition_time: Duration) -> Self {
        Self {
            composition_time,
            ..self.clone()
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Codec of an elementary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// AVC (H.264)
    H264,
    /// HEVC (H.265)
    H265,
    /// AAC
    Aac,
    /// G.711 A-law
    Pcma,
    /// G.711 mu-law
    Pcmu,
    Opus,
}

impl Codec {
    pub fn kind(&self) -> MediaKind {
        match self {
            Codec::H264 | Codec::H265 => MediaKind::Video,
            Codec::Aac | Codec::Pcma | Codec::Pcmu | Codec::Opus => MediaKind::Audio,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Codec::H264 => "H.264",
            Codec::H265 => "H.265",
            Codec::Aac => "AAC",
            Codec::Pcma => "PCMA",
            Codec::Pcmu => "PCMU",
            Codec::Opus => "Opus",
        };
        f.write_str(name)
    }
}

/// Decoder configuration of one elementary stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecData {
    pub codec: Codec,
    /// Out-of-band decoder configuration (SPS/PPS record, AudioSpecificConfig, ...)
    pub config: Bytes,
}

impl CodecData {
    pub fn new(codec: Codec, config: Bytes) -> Self {
        Self { codec, config }
    }

    pub fn kind(&self) -> MediaKind {
        self.codec.kind()
    }
}

/// Codec descriptions of all streams announced by the source, in track order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecDescription {
    streams: Vec<CodecData>,
}

impl CodecDescription {
    pub fn new(streams: Vec<CodecData>) -> Self {
        Self { streams }
    }

    pub fn streams(&self) -> &[CodecData] {
        &self.streams
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// First video stream, if any
    pub fn video(&self) -> Option<&CodecData> {
        self.streams.iter().find(|s| s.kind() == MediaKind::Video)
    }

    /// First audio stream, if any
    pub fn audio(&self) -> Option<&CodecData> {
        self.streams.iter().find(|s| s.kind() == MediaKind::Audio)
    }
}
