//! Bounded cache of recent segments
//!
//! The buffer is a single-writer/multi-reader window over the most recent
//! finished segments of a session. The ingestion loop appends, request
//! handlers read. Sequence numbers start at 1 and are never reused, including
//! across `reset()`.
//!
//! Once full, appending sequence `S` evicts `S - capacity`, so the retained
//! keys always form a contiguous window ending at the latest sequence.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::unit::MediaUnit;

/// Default number of retained segments
pub const DEFAULT_CAPACITY: usize = 6;

/// One keyframe-to-keyframe span of media. Immutable once buffered.
#[derive(Debug)]
pub struct Segment {
    sequence: u64,
    duration: Duration,
    units: Vec<MediaUnit>,
}

impl Segment {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn units(&self) -> &[MediaUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total payload size in bytes
    pub fn size(&self) -> usize {
        self.units.iter().map(MediaUnit::size).sum()
    }
}

#[derive(Debug)]
struct BufferState {
    next_sequence: u64,
    segments: BTreeMap<u64, Arc<Segment>>,
    evicted: u64,
}

/// Fixed-capacity, sequence-ordered segment cache
#[derive(Debug)]
pub struct SegmentBuffer {
    capacity: usize,
    state: Mutex<BufferState>,
    appended: Notify,
}

impl SegmentBuffer {
    /// Create a buffer retaining at most `capacity` segments (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(BufferState {
                next_sequence: 1,
                segments: BTreeMap::new(),
                evicted: 0,
            }),
            appended: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a new segment and return its sequence number.
    ///
    /// Evicts the oldest segment when the buffer is already full.
    pub fn append(&self, units: Vec<MediaUnit>, duration: Duration) -> u64 {
        let sequence = {
            let mut state = self.state.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;

            state.segments.insert(
                sequence,
                Arc::new(Segment {
                    sequence,
                    duration,
                    units,
                }),
            );

            while state.segments.len() > self.capacity {
                if state.segments.pop_first().is_some() {
                    state.evicted += 1;
                }
            }

            sequence
        };

        self.appended.notify_waiters();
        sequence
    }

    /// Look up a retained segment
    pub fn get(&self, sequence: u64) -> Option<Arc<Segment>> {
        self.state.lock().segments.get(&sequence).cloned()
    }

    /// Retained sequence numbers, ascending
    pub fn keys_ascending(&self) -> Vec<u64> {
        self.state.lock().segments.keys().copied().collect()
    }

    /// Consistent `(sequence, duration)` snapshot, ascending
    pub fn entries(&self) -> Vec<(u64, Duration)> {
        self.state
            .lock()
            .segments
            .values()
            .map(|s| (s.sequence, s.duration))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().segments.is_empty()
    }

    /// Smallest retained sequence
    pub fn first_sequence(&self) -> Option<u64> {
        self.state.lock().segments.keys().next().copied()
    }

    /// Largest retained sequence
    pub fn latest_sequence(&self) -> Option<u64> {
        self.state.lock().segments.keys().next_back().copied()
    }

    /// Total number of segments evicted since creation
    pub fn evicted(&self) -> u64 {
        self.state.lock().evicted
    }

    /// Drop all retained segments. The sequence counter keeps counting.
    pub fn reset(&self) {
        self.state.lock().segments.clear();
    }

    /// Wait until at least one segment is retained or `timeout` elapses.
    ///
    /// Returns whether the buffer holds a segment.
    pub async fn wait_for_segment(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.appended.notified();
                if !self.is_empty() {
                    return;
                }
                notified.await;
            }
        };

        let _ = tokio::time::timeout(timeout, wait).await;
        !self.is_empty()
    }
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn units(n: usize) -> Vec<MediaUnit> {
        (0..n)
            .map(|i| MediaUnit::video(Duration::from_millis(i as u64 * 40), Bytes::from_static(&[0; 8]), i == 0))
            .collect()
    }

    #[test]
    fn test_sequences_start_at_one() {
        let buffer = SegmentBuffer::new(3);

        assert_eq!(buffer.append(units(1), Duration::from_secs(2)), 1);
        assert_eq!(buffer.append(units(1), Duration::from_secs(2)), 2);
        assert_eq!(buffer.append(units(1), Duration::from_secs(2)), 3);
    }

    #[test]
    fn test_retained_window() {
        for capacity in 1..=6usize {
            for appends in 0..=12u64 {
                let buffer = SegmentBuffer::new(capacity);
                for _ in 0..appends {
                    buffer.append(units(1), Duration::from_secs(1));
                }

                let expected_len = (appends as usize).min(capacity);
                assert_eq!(buffer.len(), expected_len);

                let first = appends.saturating_sub(capacity as u64) + 1;
                let expected: Vec<u64> = (first..=appends).collect();
                assert_eq!(buffer.keys_ascending(), expected);
            }
        }
    }

    #[test]
    fn test_eviction_scenario() {
        let buffer = SegmentBuffer::new(6);
        for _ in 0..8 {
            buffer.append(units(2), Duration::from_secs(2));
        }

        assert_eq!(buffer.keys_ascending(), vec![3, 4, 5, 6, 7, 8]);
        assert!(buffer.get(2).is_none());
        assert!(buffer.get(3).is_some());
        assert_eq!(buffer.first_sequence(), Some(3));
        assert_eq!(buffer.latest_sequence(), Some(8));
        assert_eq!(buffer.evicted(), 2);
    }

    #[test]
    fn test_get_returns_stored_segment() {
        let buffer = SegmentBuffer::default();
        let seq = buffer.append(units(3), Duration::from_millis(2500));

        let segment = buffer.get(seq).unwrap();
        assert_eq!(segment.sequence(), seq);
        assert_eq!(segment.duration(), Duration::from_millis(2500));
        assert_eq!(segment.units().len(), 3);
        assert_eq!(segment.size(), 24);
    }

    #[test]
    fn test_reset_keeps_counting() {
        let buffer = SegmentBuffer::new(4);
        buffer.append(units(1), Duration::from_secs(1));
        buffer.append(units(1), Duration::from_secs(1));

        buffer.reset();
        assert!(buffer.is_empty());

        assert_eq!(buffer.append(units(1), Duration::from_secs(1)), 3);
        assert_eq!(buffer.keys_ascending(), vec![3]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let buffer = SegmentBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.append(units(1), Duration::from_secs(1));
        buffer.append(units(1), Duration::from_secs(1));
        assert_eq!(buffer.keys_ascending(), vec![2]);
    }

    #[test]
    fn test_entries_snapshot() {
        let buffer = SegmentBuffer::new(2);
        buffer.append(units(1), Duration::from_millis(1000));
        buffer.append(units(1), Duration::from_millis(2000));
        buffer.append(units(1), Duration::from_millis(3000));

        assert_eq!(
            buffer.entries(),
            vec![(2, Duration::from_millis(2000)), (3, Duration::from_millis(3000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_segment_times_out() {
        let buffer = SegmentBuffer::new(2);
        assert!(!buffer.wait_for_segment(Duration::from_secs(10)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_segment_wakes_on_append() {
        let buffer = Arc::new(SegmentBuffer::new(2));

        let writer = Arc::clone(&buffer);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            writer.append(units(1), Duration::from_secs(1));
        });

        let start = tokio::time::Instant::now();
        assert!(buffer.wait_for_segment(Duration::from_secs(10)).await);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_wait_for_segment_returns_immediately_when_filled() {
        let buffer = SegmentBuffer::new(2);
        buffer.append(units(1), Duration::from_secs(1));

        let mut wait = tokio_test::task::spawn(buffer.wait_for_segment(Duration::from_secs(1)));
        assert!(tokio_test::assert_ready!(wait.poll()));
    }
}
