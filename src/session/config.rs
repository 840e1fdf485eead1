//! Session configuration

use std::time::Duration;

use crate::media::segment::DEFAULT_CAPACITY;
use crate::transport::ConnectOptions;

/// Per-session tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Dial timeout passed to the transport
    pub dial_timeout: Duration,

    /// Read/write timeout passed to the transport
    pub read_write_timeout: Duration,

    /// Keyframe watchdog window (stall detection)
    pub keyframe_timeout: Duration,

    /// Reconnect attempts after the source stops the stream (0 = never reconnect)
    pub max_reconnect_attempts: u32,

    /// Fixed delay before each reconnect attempt
    pub reconnect_backoff: Duration,

    /// Number of segments retained for playlists
    pub buffer_capacity: usize,

    /// How long a playlist request waits for the first segment
    pub playlist_wait: Duration,

    /// Ask the source not to deliver audio
    pub disable_audio: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(3),
            read_write_timeout: Duration::from_secs(3),
            keyframe_timeout: Duration::from_secs(20),
            max_reconnect_attempts: 20,
            reconnect_backoff: Duration::from_secs(1),
            buffer_capacity: DEFAULT_CAPACITY,
            playlist_wait: Duration::from_secs(10),
            disable_audio: false,
        }
    }
}

impl SessionConfig {
    /// Set dial and read/write timeouts
    pub fn timeouts(mut self, dial: Duration, read_write: Duration) -> Self {
        self.dial_timeout = dial;
        self.read_write_timeout = read_write;
        self
    }

    /// Set the keyframe watchdog window
    pub fn keyframe_timeout(mut self, timeout: Duration) -> Self {
        self.keyframe_timeout = timeout;
        self
    }

    /// Set reconnect attempts and backoff
    pub fn reconnect(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_backoff = backoff;
        self
    }

    /// Set the number of retained segments (minimum 1)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Set the playlist cold-start wait bound
    pub fn playlist_wait(mut self, wait: Duration) -> Self {
        self.playlist_wait = wait;
        self
    }

    /// Do not request audio from the source
    pub fn disable_audio(mut self) -> Self {
        self.disable_audio = true;
        self
    }

    /// Upper bound for a whole connect call
    pub fn connect_bound(&self) -> Duration {
        self.dial_timeout + self.read_write_timeout
    }

    pub(crate) fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            dial_timeout: self.dial_timeout,
            read_write_timeout: self.read_write_timeout,
            disable_audio: self.disable_audio,
        }
    }
}
