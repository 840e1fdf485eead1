//! Media units, keyframe segmentation and the segment cache

pub mod accumulator;
pub mod segment;
pub mod unit;

pub use accumulator::{FinishedRun, SegmentAccumulator};
pub use segment::{Segment, SegmentBuffer};
pub use unit::{Codec, CodecData, CodecDescription, MediaKind, MediaUnit};
