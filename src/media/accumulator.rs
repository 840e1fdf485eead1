//! Keyframe-to-keyframe run builder
//!
//! The ingestion loop feeds every unit it receives into a `SegmentAccumulator`.
//! Units collect into a pending run until the next video keyframe arrives; at
//! that point the pending run (everything before the new keyframe) is handed
//! back as a finished run and the keyframe starts the next one.
//!
//! ```text
//!  K  p  p  a  p  K  p  a  K
//!  |<-- run 1 -->|  |<run 2>|
//!                ^ flush     ^ flush
//! duration = ts(K_next) - ts(K_prev)
//! ```
//!
//! The accumulator is owned by exactly one loop and never shared.

use std::time::Duration;

use super::unit::MediaUnit;

/// A finished keyframe-to-keyframe run
#[derive(Debug)]
pub struct FinishedRun {
    pub units: Vec<MediaUnit>,
    pub duration: Duration,
}

/// Builds segments at keyframe boundaries
#[derive(Debug, Default)]
pub struct SegmentAccumulator {
    /// Units since the last boundary
    pending: Vec<MediaUnit>,
    /// Timestamp of the keyframe that opened the pending run
    last_keyframe: Option<Duration>,
    /// Pending payload size in bytes
    pending_size: usize,
}

impl SegmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit, returning the finished run if this unit closes one.
    pub fn push(&mut self, unit: MediaUnit) -> Option<FinishedRun> {
        let mut finished = None;

        if unit.is_video_keyframe() {
            if let Some(previous) = self.last_keyframe {
                let duration = unit.timestamp.saturating_sub(previous);
                let units = std::mem::take(&mut self.pending);
                self.pending_size = 0;
                finished = Some(FinishedRun { units, duration });
            }
            self.last_keyframe = Some(unit.timestamp);
        }

        self.pending_size += unit.size();
        self.pending.push(unit);
        finished
    }

    /// Number of units in the pending run
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending payload size in bytes
    pub fn pending_size(&self) -> usize {
        self.pending_size
    }

    /// Timestamp of the keyframe that opened the pending run
    pub fn last_keyframe(&self) -> Option<Duration> {
        self.last_keyframe
    }
}
