//! Per-source ingestion sessions
//!
//! A `Session` pulls one live source through the transport, cuts it into
//! keyframe-aligned segments and serves playlists and segment bytes from its
//! bounded buffer.
//!
//! ```text
//!  Transport ──► worker task ──► SegmentBuffer ◄── playlist()
//!                    │                        ◄── segment("7.ts")
//!                    └── SessionEvent (Stopped | Error) ──► registry subscribers
//! ```
//!
//! `stop()` only requests shutdown; `stopped().await` waits for the worker to
//! acknowledge it.

pub mod config;
pub(crate) mod context;
pub mod event;
pub mod state;
pub(crate) mod worker;

pub use config::SessionConfig;
pub use event::SessionEvent;
pub use state::{SessionState, SessionStatus};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{PlaylistError, SegmentError, SessionError};
use crate::hls::{materialize, parse_segment_name, playlist};
use crate::media::CodecDescription;
use crate::mux::Muxer;
use crate::stats::SessionStats;
use crate::transport::Transport;

use self::context::SessionContext;
use self::worker::Worker;

/// Monitoring snapshot of a session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    /// Source address with credentials redacted
    pub address: String,
    pub state: SessionState,
    pub last_error: Option<SessionError>,
    pub reconnect_attempts: u32,
    /// Retained segment sequences, ascending
    pub sequences: Vec<u64>,
    pub codecs: CodecDescription,
    pub stats: SessionStats,
}

/// Handles of a running worker
struct WorkerHandle {
    /// Stop request
    cancel: CancellationToken,
    /// Fired once the worker task has exited
    done: CancellationToken,
}

impl WorkerHandle {
    fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }
}

/// One shared ingestion session for a source address
pub struct Session<T: Transport, M: Muxer> {
    context: Arc<SessionContext>,
    transport: Arc<T>,
    muxer: Arc<M>,
    config: SessionConfig,
    /// Serializes start/restart
    start_gate: tokio::sync::Mutex<()>,
    worker: parking_lot::Mutex<Option<WorkerHandle>>,
}

impl<T: Transport, M: Muxer> Session<T, M> {
    pub(crate) fn new(
        address: String,
        transport: Arc<T>,
        muxer: Arc<M>,
        config: SessionConfig,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(id, address, config.buffer_capacity, events);

        Self {
            context: Arc::new(context),
            transport,
            muxer,
            config,
            start_gate: tokio::sync::Mutex::new(()),
            worker: parking_lot::Mutex::new(None),
        }
    }

    /// Unique session ID
    pub fn id(&self) -> &str {
        &self.context.id
    }

    /// Source address as opened
    pub fn address(&self) -> &str {
        &self.context.address
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.context.state()
    }

    pub fn status(&self) -> SessionStatus {
        self.context.status()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.context.status().last_error
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.context.status().reconnect_attempts
    }

    /// Watch status transitions
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.context.subscribe_status()
    }

    /// Codec parameters of the current connection
    pub fn codec_description(&self) -> CodecDescription {
        self.context.codecs()
    }

    /// Retained segment sequences, ascending
    pub fn sequences(&self) -> Vec<u64> {
        self.context.buffer.keys_ascending()
    }

    pub fn stats(&self) -> SessionStats {
        self.context
            .counters
            .snapshot(self.context.buffer.evicted())
    }

    pub fn info(&self) -> SessionInfo {
        let status = self.context.status();

        SessionInfo {
            id: self.context.id.clone(),
            address: self.context.log_address().into_owned(),
            state: status.state,
            last_error: status.last_error,
            reconnect_attempts: status.reconnect_attempts,
            sequences: self.sequences(),
            codecs: self.context.codecs(),
            stats: self.stats(),
        }
    }

    /// Connect and spawn the ingestion worker.
    ///
    /// No-op if the session is already connecting or running. A session that
    /// is still shutting down is waited for, then restarted.
    pub async fn start(&self) -> Result<(), SessionError> {
        let _gate = self.start_gate.lock().await;

        let pending = {
            let worker = self.worker.lock();
            match worker.as_ref() {
                Some(handle) if !handle.is_finished() => {
                    if self.context.state().is_live() {
                        return Ok(());
                    }
                    Some(handle.done.clone())
                }
                _ => None,
            }
        };
        if let Some(done) = pending {
            done.cancelled().await;
        }

        let connection = self
            .context
            .open_connection(&*self.transport, &self.config)
            .await?;

        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        self.context.mark_connected();

        tracing::info!(
            session_id = %self.context.id,
            address = %self.context.log_address(),
            "Session running"
        );

        let worker = Worker::new(
            Arc::clone(&self.context),
            Arc::clone(&self.transport),
            self.config.clone(),
            cancel.clone(),
        );
        let task = tokio::spawn(worker.run(connection));

        let context = Arc::clone(&self.context);
        let finished = done.clone();
        tokio::spawn(async move {
            if let Err(err) = task.await {
                if err.is_panic() {
                    context.fail(
                        SessionError::Internal("ingestion worker panicked".into()),
                        0,
                    );
                }
            }
            finished.cancel();
        });

        *self.worker.lock() = Some(WorkerHandle { cancel, done });
        Ok(())
    }

    /// Request the worker to stop. Does not wait for it; see `stopped()`.
    pub fn stop(&self) -> Result<(), SessionError> {
        let worker = self.worker.lock();
        let handle = match worker.as_ref() {
            Some(handle) if !handle.is_finished() && !handle.cancel.is_cancelled() => handle,
            _ => return Err(SessionError::NotStarted),
        };

        if !self.context.begin_stop() {
            return Err(SessionError::NotStarted);
        }
        handle.cancel.cancel();

        tracing::info!(session_id = %self.context.id, "Stop requested");
        Ok(())
    }

    /// Wait until the current worker (if any) has exited
    pub async fn stopped(&self) {
        let done = self.worker.lock().as_ref().map(|h| h.done.clone());
        if let Some(done) = done {
            done.cancelled().await;
        }
    }

    /// Render the playlist, waiting up to the configured bound for the
    /// first segment after a cold start.
    pub async fn playlist(&self, base_url: &str) -> Result<String, PlaylistError> {
        let buffer = &self.context.buffer;

        // Nothing will be appended until the next start
        if buffer.is_empty() && self.context.state().is_terminal() {
            return Err(PlaylistError::NotReady);
        }

        if !buffer.wait_for_segment(self.config.playlist_wait).await {
            tracing::debug!(
                session_id = %self.context.id,
                waited_ms = self.config.playlist_wait.as_millis() as u64,
                "Playlist requested before first segment"
            );
        }

        playlist::render(buffer, base_url)
    }

    /// Materialize a segment by name (`7`, `7.ts` or `.../7.ts`).
    pub fn segment(&self, name: &str) -> Result<Bytes, SegmentError> {
        let result = parse_segment_name(name).and_then(|sequence| {
            let segment = self
                .context
                .buffer
                .get(sequence)
                .ok_or(SegmentError::NotFound(sequence))?;
            materialize(&*self.muxer, &self.context.codecs(), &segment)
        });

        if let Err(ref e) = result {
            tracing::debug!(
                session_id = %self.context.id,
                segment = name,
                error = %e,
                "Segment request failed"
            );
        }

        result
    }
}

impl<T: Transport, M: Muxer> fmt::Debug for Session<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.context.id)
            .field("address", &self.context.log_address())
            .field("state", &self.context.state())
            .field("segments", &self.context.buffer.len())
            .finish()
    }
}
