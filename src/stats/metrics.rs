//! Statistics for ingestion sessions

use std::sync::atomic::{AtomicU64, Ordering};

use crate::media::MediaUnit;

/// Point-in-time ingestion statistics of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Media units received (all kinds)
    pub units_received: u64,
    /// Video units received
    pub video_units: u64,
    /// Audio units received
    pub audio_units: u64,
    /// Video keyframes received
    pub keyframes: u64,
    /// Total payload bytes received
    pub bytes_received: u64,
    /// Segments finalized into the buffer
    pub segments_produced: u64,
    /// Segments dropped from the buffer by eviction
    pub segments_evicted: u64,
    /// Successful automatic reconnects
    pub reconnects: u64,
    /// Codec update signals handled
    pub codec_updates: u64,
}

impl SessionStats {
    /// Average units per finalized segment
    pub fn units_per_segment(&self) -> Option<f64> {
        if self.segments_produced > 0 {
            Some(self.units_received as f64 / self.segments_produced as f64)
        } else {
            None
        }
    }
}

/// Lock-free counters updated by the ingestion loop
#[derive(Debug, Default)]
pub(crate) struct IngestCounters {
    units: AtomicU64,
    video_units: AtomicU64,
    audio_units: AtomicU64,
    keyframes: AtomicU64,
    bytes: AtomicU64,
    segments: AtomicU64,
    reconnects: AtomicU64,
    codec_updates: AtomicU64,
}

impl IngestCounters {
    pub(crate) fn on_unit(&self, unit: &MediaUnit) {
        self.units.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(unit.size() as u64, Ordering::Relaxed);
        if unit.is_video() {
            self.video_units.fetch_add(1, Ordering::Relaxed);
        } else {
            self.audio_units.fetch_add(1, Ordering::Relaxed);
        }
        if unit.is_video_keyframe() {
            self.keyframes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn on_segment(&self) {
        self.segments.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_codec_update(&self) {
        self.codec_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, segments_evicted: u64) -> SessionStats {
        SessionStats {
            units_received: self.units.load(Ordering::Relaxed),
            video_units: self.video_units.load(Ordering::Relaxed),
            audio_units: self.audio_units.load(Ordering::Relaxed),
            keyframes: self.keyframes.load(Ordering::Relaxed),
            bytes_received: self.bytes.load(Ordering::Relaxed),
            segments_produced: self.segments.load(Ordering::Relaxed),
            segments_evicted,
            reconnects: self.reconnects.load(Ordering::Relaxed),
            codec_updates: self.codec_updates.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    #[test]
    fn test_session_stats_default() {
        let stats = SessionStats::default();
        assert_eq!(stats.units_received, 0);
        assert_eq!(stats.segments_produced, 0);
        assert!(stats.units_per_segment().is_none());
    }

    #[test]
    fn test_counters_track_units() {
        let counters = IngestCounters::default();

        counters.on_unit(&MediaUnit::video(Duration::ZERO, Bytes::from(vec![0u8; 100]), true));
        counters.on_unit(&MediaUnit::video(Duration::ZERO, Bytes::from(vec![0u8; 50]), false));
        counters.on_unit(&MediaUnit::audio(Duration::ZERO, Bytes::from(vec![0u8; 10])));
        counters.on_segment();

        let stats = counters.snapshot(0);
        assert_eq!(stats.units_received, 3);
        assert_eq!(stats.video_units, 2);
        assert_eq!(stats.audio_units, 1);
        assert_eq!(stats.keyframes, 1);
        assert_eq!(stats.bytes_received, 160);
        assert_eq!(stats.segments_produced, 1);
        assert_eq!(stats.units_per_segment(), Some(3.0));
    }

    #[test]
    fn test_snapshot_carries_evictions() {
        let counters = IngestCounters::default();
        counters.on_reconnect();
        counters.on_codec_update();

        let stats = counters.snapshot(4);
        assert_eq!(stats.segments_evicted, 4);
        assert_eq!(stats.reconnects, 1);
        assert_eq!(stats.codec_updates, 1);
    }
}
