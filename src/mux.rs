//! Container muxer capability
//!
//! Packaging media units into the served container (MPEG-TS) is provided
//! from outside. A fresh writer is created for every materialized segment,
//! so writers never carry state between requests.

use std::fmt;

use bytes::BytesMut;

use crate::media::{CodecDescription, MediaUnit};

/// Stage of a segment write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxStage {
    Header,
    Unit,
    Trailer,
}

impl fmt::Display for MuxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxStage::Header => f.write_str("header"),
            MuxStage::Unit => f.write_str("unit"),
            MuxStage::Trailer => f.write_str("trailer"),
        }
    }
}

/// Error reported by a segment writer
#[derive(Debug)]
pub enum MuxError {
    /// No stream in the codec description can be muxed
    UnsupportedCodec(String),
    /// The unit does not belong to any stream announced in the header
    UnknownStream,
    /// Writing to the output failed
    Io(std::io::Error),
    Other(String),
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxError::UnsupportedCodec(codec) => write!(f, "unsupported codec: {}", codec),
            MuxError::UnknownStream => write!(f, "unit for unknown stream"),
            MuxError::Io(e) => write!(f, "I/O error: {}", e),
            MuxError::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for MuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MuxError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MuxError {
    fn from(e: std::io::Error) -> Self {
        MuxError::Io(e)
    }
}

/// Factory for segment writers
pub trait Muxer: Send + Sync + 'static {
    type Writer: SegmentWriter;

    /// Start a writer producing into `output`
    fn new_writer(&self, output: BytesMut) -> Self::Writer;
}

/// Writes one container chunk
pub trait SegmentWriter {
    fn write_header(&mut self, codecs: &CodecDescription) -> Result<(), MuxError>;

    fn write_unit(&mut self, unit: &MediaUnit) -> Result<(), MuxError>;

    fn write_trailer(&mut self) -> Result<(), MuxError>;

    /// Give back the output buffer
    fn into_output(self) -> BytesMut;
}
