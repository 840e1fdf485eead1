//! On-demand segment materialization
//!
//! Cached segments keep their raw units; the container bytes are produced per
//! request with a fresh writer, so concurrent requests share nothing but the
//! immutable segment.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::error::SegmentError;
use crate::media::{CodecDescription, Segment};
use crate::mux::{MuxError, MuxStage, Muxer, SegmentWriter};

use super::playlist::SEGMENT_SUFFIX;

/// Composition time written for every unit; the output format expects a
/// constant non-zero offset.
pub const COMPOSITION_TIME_PLACEHOLDER: Duration = Duration::from_nanos(1);

/// Parse a segment reference into its sequence number.
///
/// Accepts `7`, `7.ts` and paths or URLs ending in `/7.ts`.
pub fn parse_segment_name(name: &str) -> Result<u64, SegmentError> {
    let last = name.rsplit('/').next().unwrap_or(name);
    let stem = last.strip_suffix(SEGMENT_SUFFIX).unwrap_or(last);

    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SegmentError::InvalidName(name.to_string()));
    }

    stem.parse::<u64>()
        .map_err(|_| SegmentError::InvalidName(name.to_string()))
}

/// Mux `segment` into a standalone container chunk.
pub fn materialize<M: Muxer>(
    muxer: &M,
    codecs: &CodecDescription,
    segment: &Segment,
) -> Result<Bytes, SegmentError> {
    let sequence = segment.sequence();
    if segment.is_empty() {
        return Err(SegmentError::Empty(sequence));
    }

    let estimate = segment.size() + segment.units().len() * 32;
    let result = catch_unwind(AssertUnwindSafe(|| {
        write_segment(muxer.new_writer(BytesMut::with_capacity(estimate)), codecs, segment)
    }));

    match result {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err((stage, err))) => Err(SegmentError::MuxWriteFailure {
            sequence,
            stage,
            reason: err.to_string(),
        }),
        Err(_) => Err(SegmentError::MuxerPanicked(sequence)),
    }
}

fn write_segment<W: SegmentWriter>(
    mut writer: W,
    codecs: &CodecDescription,
    segment: &Segment,
) -> Result<Bytes, (MuxStage, MuxError)> {
    writer
        .write_header(codecs)
        .map_err(|e| (MuxStage::Header, e))?;

    for unit in segment.units() {
        let unit = unit.with_composition_time(COMPOSITION_TIME_PLACEHOLDER);
        writer.write_unit(&unit).map_err(|e| (MuxStage::Unit, e))?;
    }

    writer
        .write_trailer()
        .map_err(|e| (MuxStage::Trailer, e))?;

    Ok(writer.into_output().freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaUnit, SegmentBuffer};
    use crate::testing::{test_codecs, MockMuxer};

    fn buffer_with(units: Vec<MediaUnit>) -> (SegmentBuffer, u64) {
        let buffer = SegmentBuffer::new(4);
        let seq = buffer.append(units, Duration::from_secs(2));
        (buffer, seq)
    }

    fn units() -> Vec<MediaUnit> {
        let mut key = MediaUnit::video(Duration::ZERO, Bytes::from_static(b"KEY"), true);
        key.composition_time = Duration::from_millis(80);
        vec![
            key,
            MediaUnit::audio(Duration::from_millis(10), Bytes::from_static(b"aud")),
            MediaUnit::video(Duration::from_millis(40), Bytes::from_static(b"p1"), false),
        ]
    }

    #[test]
    fn test_parse_segment_name() {
        assert_eq!(parse_segment_name("6"), Ok(6));
        assert_eq!(parse_segment_name("6.ts"), Ok(6));
        assert_eq!(parse_segment_name("stream/01HTXY957AYZCTRAHT8XPE27ZT/6.ts"), Ok(6));
        assert_eq!(parse_segment_name("http://host/stream/id/media/42.ts"), Ok(42));
    }

    #[test]
    fn test_parse_segment_name_invalid() {
        for name in ["", "abc.ts", "media/", "-1.ts", "+5.ts", "+5", " 5.ts", "6.mp4"] {
            assert!(
                matches!(parse_segment_name(name), Err(SegmentError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_materialize_writes_all_units() {
        let muxer = MockMuxer::new();
        let (buffer, seq) = buffer_with(units());
        let segment = buffer.get(seq).unwrap();

        let bytes = materialize(&muxer, &test_codecs(), &segment).unwrap();

        assert_eq!(&bytes[..], b"HDR(1)|KEY@1ns|aud@1ns|p1@1ns|END");
    }

    #[test]
    fn test_materialize_does_not_touch_cached_units() {
        let muxer = MockMuxer::new();
        let (buffer, seq) = buffer_with(units());
        let segment = buffer.get(seq).unwrap();

        materialize(&muxer, &test_codecs(), &segment).unwrap();

        assert_eq!(segment.units()[0].composition_time, Duration::from_millis(80));
    }

    #[test]
    fn test_materialize_empty_segment() {
        let muxer = MockMuxer::new();
        let (buffer, seq) = buffer_with(Vec::new());
        let segment = buffer.get(seq).unwrap();

        assert_eq!(
            materialize(&muxer, &test_codecs(), &segment),
            Err(SegmentError::Empty(seq))
        );
        assert_eq!(muxer.writers_created(), 0);
    }

    #[test]
    fn test_materialize_reports_failing_stage() {
        for stage in [MuxStage::Header, MuxStage::Unit, MuxStage::Trailer] {
            let muxer = MockMuxer::failing_at(stage);
            let (buffer, seq) = buffer_with(units());
            let segment = buffer.get(seq).unwrap();

            match materialize(&muxer, &test_codecs(), &segment) {
                Err(SegmentError::MuxWriteFailure {
                    sequence,
                    stage: failed,
                    ..
                }) => {
                    assert_eq!(sequence, seq);
                    assert_eq!(failed, stage);
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_materialize_contains_muxer_panic() {
        let muxer = MockMuxer::panicking();
        let (buffer, seq) = buffer_with(units());
        let segment = buffer.get(seq).unwrap();

        assert_eq!(
            materialize(&muxer, &test_codecs(), &segment),
            Err(SegmentError::MuxerPanicked(seq))
        );
    }

    #[test]
    fn test_materialize_is_stateless() {
        let muxer = MockMuxer::new();
        let (buffer, seq) = buffer_with(units());
        let segment = buffer.get(seq).unwrap();

        let first = materialize(&muxer, &test_codecs(), &segment).unwrap();
        let second = materialize(&muxer, &test_codecs(), &segment).unwrap();

        assert_eq!(first, second);
        assert_eq!(muxer.writers_created(), 2);
    }
}
