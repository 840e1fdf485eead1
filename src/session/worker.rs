//! Ingestion loop and reconnect supervisor
//!
//! One worker task per session. It owns the transport connection and the
//! segment accumulator, multiplexes three event sources and is the only
//! writer of the session's segment buffer:
//!
//! ```text
//!            ┌── stop token ─────────► Stopped            (terminal)
//!  select! ──┼── keyframe watchdog ──► Errored            (terminal)
//!            └── connection.recv() ─┬► unit ──► accumulator ──► buffer
//!                                   ├► CodecUpdate ──► codecs
//!                                   └► StreamStopped / end ──► reconnect
//!                                         ├ success ─► loop again
//!                                         └ exhausted ─► Errored
//! ```

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::media::SegmentAccumulator;
use crate::transport::{Connection, ControlSignal, Transport, TransportEvent};

use super::config::SessionConfig;
use super::context::SessionContext;

/// Why an ingestion run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Cancelled,
    Stalled,
    SourceStopped,
}

enum Reconnect<C> {
    Connected(C),
    Cancelled,
    Exhausted { cause: SessionError, attempts: u32 },
}

pub(crate) struct Worker<T: Transport> {
    context: Arc<SessionContext>,
    transport: Arc<T>,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl<T: Transport> Worker<T> {
    pub(crate) fn new(
        context: Arc<SessionContext>,
        transport: Arc<T>,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            context,
            transport,
            config,
            cancel,
        }
    }

    /// Run until stopped, stalled or out of reconnect attempts.
    pub(crate) async fn run(self, mut connection: T::Connection) {
        loop {
            let exit = self.ingest(&mut connection).await;
            connection.close().await;

            match exit {
                Exit::Cancelled => {
                    self.context.finish_stopped();
                    return;
                }
                Exit::Stalled => {
                    self.context.fail(
                        SessionError::StallTimeout {
                            window: self.config.keyframe_timeout,
                        },
                        0,
                    );
                    return;
                }
                Exit::SourceStopped => match self.reconnect().await {
                    Reconnect::Connected(next) => connection = next,
                    Reconnect::Cancelled => {
                        self.context.finish_stopped();
                        return;
                    }
                    Reconnect::Exhausted { cause, attempts } => {
                        self.context.fail(cause, attempts);
                        return;
                    }
                },
            }
        }
    }

    async fn ingest(&self, connection: &mut T::Connection) -> Exit {
        let window = self.config.keyframe_timeout;
        let watchdog = tokio::time::sleep(window);
        tokio::pin!(watchdog);

        let mut accumulator = SegmentAccumulator::new();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Exit::Cancelled,

                _ = &mut watchdog => {
                    tracing::warn!(
                        session_id = %self.context.id,
                        window_secs = window.as_secs_f64(),
                        "No keyframe received within watchdog window"
                    );
                    return Exit::Stalled;
                }

                event = connection.recv() => match event {
                    Some(TransportEvent::Unit(unit)) => {
                        if unit.is_video_keyframe() {
                            watchdog.as_mut().reset(Instant::now() + window);
                        }
                        self.context.counters.on_unit(&unit);

                        if let Some(run) = accumulator.push(unit) {
                            let units = run.units.len();
                            let sequence = self.context.buffer.append(run.units, run.duration);
                            self.context.counters.on_segment();

                            tracing::debug!(
                                session_id = %self.context.id,
                                sequence = sequence,
                                units = units,
                                duration_ms = run.duration.as_millis() as u64,
                                "Segment finalized"
                            );
                        }
                    }
                    Some(TransportEvent::Signal(ControlSignal::CodecUpdate)) => {
                        self.context.set_codecs(connection.codec_description());
                        self.context.counters.on_codec_update();
                        tracing::info!(session_id = %self.context.id, "Codec update");
                    }
                    Some(TransportEvent::Signal(ControlSignal::StreamStopped)) => {
                        tracing::info!(session_id = %self.context.id, "Source stopped the stream");
                        return Exit::SourceStopped;
                    }
                    None => {
                        tracing::warn!(session_id = %self.context.id, "Source event stream ended");
                        return Exit::SourceStopped;
                    }
                },
            }
        }
    }

    async fn reconnect(&self) -> Reconnect<T::Connection> {
        let max_attempts = self.config.max_reconnect_attempts;
        let mut cause = SessionError::PeerDisconnect;

        for attempt in 1..=max_attempts {
            self.context.mark_reconnecting(attempt);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Reconnect::Cancelled,
                _ = tokio::time::sleep(self.config.reconnect_backoff) => {}
            }

            tracing::info!(
                session_id = %self.context.id,
                address = %self.context.log_address(),
                attempt = attempt,
                max_attempts = max_attempts,
                "Reconnecting"
            );

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Reconnect::Cancelled,
                result = self.context.open_connection(&*self.transport, &self.config) => result,
            };

            match result {
                Ok(connection) => {
                    self.context.mark_connected();
                    self.context.counters.on_reconnect();
                    tracing::info!(
                        session_id = %self.context.id,
                        attempt = attempt,
                        "Reconnected"
                    );
                    return Reconnect::Connected(connection);
                }
                Err(err) => cause = err,
            }
        }

        Reconnect::Exhausted {
            cause,
            attempts: max_attempts,
        }
    }
}
