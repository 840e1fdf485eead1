//! Live playlist rendering
//!
//! The output is a fixed-format media playlist:
//!
//! ```text
//! #EXTM3U
//! #EXT-X-TARGETDURATION:4
//! #EXT-X-VERSION:4
//! #EXT-X-MEDIA-SEQUENCE:<first retained sequence>
//! #EXTINF:<seconds, one decimal>,
//! <base_url><sequence>.ts
//! ...
//! ```
//!
//! Players address segments as `<base_url><sequence>.ts`, which is what
//! `materializer::parse_segment_name` accepts back.

use std::fmt::Write;
use std::time::Duration;

use crate::error::PlaylistError;
use crate::media::SegmentBuffer;

/// Advertised `#EXT-X-TARGETDURATION`
pub const TARGET_DURATION: u32 = 4;

/// Advertised `#EXT-X-VERSION`
pub const VERSION: u32 = 4;

/// Segment resource suffix
pub const SEGMENT_SUFFIX: &str = ".ts";

/// Render the retained segments of `buffer` as a playlist.
///
/// Fails with `NotReady` when nothing is retained.
pub fn render(buffer: &SegmentBuffer, base_url: &str) -> Result<String, PlaylistError> {
    render_entries(&buffer.entries(), base_url)
}

/// Render an ascending `(sequence, duration)` list.
pub fn render_entries(entries: &[(u64, Duration)], base_url: &str) -> Result<String, PlaylistError> {
    let (first, _) = entries.first().ok_or(PlaylistError::NotReady)?;

    let mut out = String::with_capacity(96 + entries.len() * (base_url.len() + 32));
    // Writing into a String cannot fail
    let _ = write!(
        out,
        "#EXTM3U\n#EXT-X-TARGETDURATION:{}\n#EXT-X-VERSION:{}\n#EXT-X-MEDIA-SEQUENCE:{}\n",
        TARGET_DURATION, VERSION, first
    );

    for (sequence, duration) in entries {
        let _ = write!(
            out,
            "#EXTINF:{:.1},\n{}{}{}\n",
            duration.as_secs_f64(),
            base_url,
            sequence,
            SEGMENT_SUFFIX
        );
    }

    Ok(out)
}
