//! State shared between a session handle and its ingestion worker
//!
//! The worker is the only writer of the segment buffer and the counters.
//! Request handlers read through the handle. Status changes go through a
//! `watch` channel so callers can await transitions.

use std::borrow::Cow;

use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};

use crate::error::SessionError;
use crate::media::{CodecDescription, SegmentBuffer};
use crate::stats::IngestCounters;
use crate::transport::{redact_credentials, Connection, Transport};

use super::config::SessionConfig;
use super::event::SessionEvent;
use super::state::{SessionState, SessionStatus};

pub(crate) struct SessionContext {
    pub(crate) id: String,
    pub(crate) address: String,
    pub(crate) buffer: SegmentBuffer,
    pub(crate) counters: IngestCounters,
    status: watch::Sender<SessionStatus>,
    codecs: RwLock<CodecDescription>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub(crate) fn new(
        id: String,
        address: String,
        buffer_capacity: usize,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::new());

        Self {
            id,
            address,
            buffer: SegmentBuffer::new(buffer_capacity),
            counters: IngestCounters::default(),
            status,
            codecs: RwLock::new(CodecDescription::default()),
            events,
        }
    }

    /// Source address safe for logs
    pub(crate) fn log_address(&self) -> Cow<'_, str> {
        redact_credentials(&self.address)
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub(crate) fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    pub(crate) fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub(crate) fn codecs(&self) -> CodecDescription {
        self.codecs.read().clone()
    }

    pub(crate) fn set_codecs(&self, codecs: CodecDescription) {
        *self.codecs.write() = codecs;
    }

    /// Dial the source: clears the last error and the retained segments.
    ///
    /// On failure the previous state is restored and the error recorded.
    pub(crate) async fn open_connection<T: Transport>(
        &self,
        transport: &T,
        config: &SessionConfig,
    ) -> Result<T::Connection, SessionError> {
        let mut previous = SessionState::Idle;
        self.status.send_modify(|s| previous = s.begin_connect());
        self.buffer.reset();

        let bound = config.connect_bound();
        let result = tokio::time::timeout(
            bound,
            transport.connect(&self.address, config.connect_options()),
        )
        .await;

        let error = match result {
            Ok(Ok(connection)) => {
                self.set_codecs(connection.codec_description());
                return Ok(connection);
            }
            Ok(Err(e)) => SessionError::ConnectFailure {
                reason: e.to_string(),
            },
            Err(_) => SessionError::ConnectFailure {
                reason: format!("no session established within {:?}", bound),
            },
        };

        tracing::warn!(
            session_id = %self.id,
            address = %self.log_address(),
            error = %error,
            "Connect failed"
        );
        self.status
            .send_modify(|s| s.connect_failed(previous, error.clone()));
        Err(error)
    }

    pub(crate) fn mark_connected(&self) {
        self.status.send_modify(SessionStatus::connected);
    }

    pub(crate) fn mark_reconnecting(&self, attempt: u32) {
        self.status.send_modify(|s| s.reconnecting(attempt));
    }

    /// Returns false if the session was not live
    pub(crate) fn begin_stop(&self) -> bool {
        self.status.send_if_modified(SessionStatus::begin_stop)
    }

    /// Terminal: stopped on request
    pub(crate) fn finish_stopped(&self) {
        self.status.send_modify(SessionStatus::stopped);
        tracing::info!(
            session_id = %self.id,
            address = %self.log_address(),
            "Session stopped"
        );
        self.emit(SessionEvent::Stopped {
            session_id: self.id.clone(),
        });
    }

    /// Terminal: record `error` and raise an error event
    pub(crate) fn fail(&self, error: SessionError, reconnect_attempts: u32) {
        self.status.send_modify(|s| s.errored(error.clone()));
        tracing::error!(
            session_id = %self.id,
            address = %self.log_address(),
            error = %error,
            reconnect_attempts = reconnect_attempts,
            "Session terminated"
        );
        self.emit(SessionEvent::Error {
            session_id: self.id.clone(),
            cause: error,
            reconnect_attempts,
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine: events are advisory
        let _ = self.events.send(event);
    }
}
