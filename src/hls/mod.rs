//! HLS output: playlist text and segment bytes
//!
//! Both are computed on demand from a session's segment buffer. Nothing is
//! written to disk.

pub mod materializer;
pub mod playlist;

pub use materializer::{materialize, parse_segment_name, COMPOSITION_TIME_PLACEHOLDER};
pub use playlist::{render, render_entries, SEGMENT_SUFFIX, TARGET_DURATION};
