//! Scripted transport and muxer doubles for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::media::{Codec, CodecData, CodecDescription, MediaUnit};
use crate::mux::{MuxError, MuxStage, Muxer, SegmentWriter};
use crate::transport::{
    ConnectOptions, Connection, ControlSignal, Transport, TransportError, TransportEvent,
};

pub(crate) fn test_codecs() -> CodecDescription {
    CodecDescription::new(vec![CodecData::new(
        Codec::H264,
        Bytes::from_static(&[0x01, 0x64, 0x00, 0x1f]),
    )])
}

enum Script {
    Accept(MockConnection),
    Reject(String),
    Hang,
}

/// Transport whose connect results are queued up front.
/// An empty queue rejects.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Script>>,
    connects: AtomicUsize,
    addresses: Mutex<Vec<String>>,
    last_options: Mutex<Option<ConnectOptions>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful connect; the returned feed drives the connection
    pub(crate) fn accept(&self) -> MockFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(FeedShared {
            codecs: Mutex::new(test_codecs()),
            closed: AtomicBool::new(false),
            poisoned: AtomicBool::new(false),
        });

        self.script.lock().push_back(Script::Accept(MockConnection {
            events: rx,
            shared: Arc::clone(&shared),
        }));

        MockFeed { tx, shared }
    }

    pub(crate) fn reject(&self, reason: &str) {
        self.script
            .lock()
            .push_back(Script::Reject(reason.to_string()));
    }

    /// Queue a connect that never completes
    pub(crate) fn hang(&self) {
        self.script.lock().push_back(Script::Hang);
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn addresses(&self) -> Vec<String> {
        self.addresses.lock().clone()
    }

    pub(crate) fn last_options(&self) -> Option<ConnectOptions> {
        *self.last_options.lock()
    }
}

impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn connect(
        &self,
        address: &str,
        options: ConnectOptions,
    ) -> Result<MockConnection, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().push(address.to_string());
        *self.last_options.lock() = Some(options);

        let next = self.script.lock().pop_front();
        match next {
            Some(Script::Accept(connection)) => Ok(connection),
            Some(Script::Reject(reason)) => Err(TransportError::Rejected(reason)),
            Some(Script::Hang) => std::future::pending().await,
            None => Err(TransportError::Rejected("no scripted connection".into())),
        }
    }
}

struct FeedShared {
    codecs: Mutex<CodecDescription>,
    closed: AtomicBool,
    poisoned: AtomicBool,
}

pub(crate) struct MockConnection {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    shared: Arc<FeedShared>,
}

impl Connection for MockConnection {
    async fn recv(&mut self) -> Option<TransportEvent> {
        let event = self.events.recv().await;
        if self.shared.poisoned.load(Ordering::SeqCst) {
            panic!("poisoned mock connection");
        }
        event
    }

    fn codec_description(&self) -> CodecDescription {
        self.shared.codecs.lock().clone()
    }

    async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.events.close();
    }
}

/// Test-side handle feeding a mock connection. Dropping it ends the event
/// stream.
pub(crate) struct MockFeed {
    tx: mpsc::UnboundedSender<TransportEvent>,
    shared: Arc<FeedShared>,
}

impl MockFeed {
    pub(crate) fn unit(&self, unit: MediaUnit) {
        let _ = self.tx.send(TransportEvent::Unit(unit));
    }

    pub(crate) fn key(&self, ms: u64) {
        self.unit(MediaUnit::video(
            Duration::from_millis(ms),
            Bytes::from(format!("K{ms}")),
            true,
        ));
    }

    pub(crate) fn frame(&self, ms: u64) {
        self.unit(MediaUnit::video(
            Duration::from_millis(ms),
            Bytes::from(format!("P{ms}")),
            false,
        ));
    }

    pub(crate) fn audio(&self, ms: u64) {
        self.unit(MediaUnit::audio(
            Duration::from_millis(ms),
            Bytes::from(format!("A{ms}")),
        ));
    }

    pub(crate) fn signal(&self, signal: ControlSignal) {
        let _ = self.tx.send(TransportEvent::Signal(signal));
    }

    pub(crate) fn set_codecs(&self, codecs: CodecDescription) {
        *self.shared.codecs.lock() = codecs;
    }

    /// Make the next `recv` panic
    pub(crate) fn poison(&self) {
        self.shared.poisoned.store(true, Ordering::SeqCst);
        self.signal(ControlSignal::CodecUpdate);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

/// Muxer writing a readable trace instead of a real container:
/// `HDR(<streams>)|<payload>@<composition time>|...|END`
#[derive(Default)]
pub(crate) struct MockMuxer {
    fail_at: Option<MuxStage>,
    panic: bool,
    writers: AtomicUsize,
}

impl MockMuxer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_at(stage: MuxStage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub(crate) fn writers_created(&self) -> usize {
        self.writers.load(Ordering::SeqCst)
    }
}

impl Muxer for MockMuxer {
    type Writer = MockWriter;

    fn new_writer(&self, output: BytesMut) -> MockWriter {
        self.writers.fetch_add(1, Ordering::SeqCst);
        MockWriter {
            output,
            fail_at: self.fail_at,
            panic: self.panic,
        }
    }
}

pub(crate) struct MockWriter {
    output: BytesMut,
    fail_at: Option<MuxStage>,
    panic: bool,
}

impl MockWriter {
    fn check(&self, stage: MuxStage) -> Result<(), MuxError> {
        if self.panic {
            panic!("mock muxer panic at {stage}");
        }
        if self.fail_at == Some(stage) {
            return Err(MuxError::Other(format!("{stage} refused")));
        }
        Ok(())
    }
}

impl SegmentWriter for MockWriter {
    fn write_header(&mut self, codecs: &CodecDescription) -> Result<(), MuxError> {
        self.check(MuxStage::Header)?;
        self.output
            .extend_from_slice(format!("HDR({})", codecs.streams().len()).as_bytes());
        Ok(())
    }

    fn write_unit(&mut self, unit: &MediaUnit) -> Result<(), MuxError> {
        self.check(MuxStage::Unit)?;
        self.output.extend_from_slice(b"|");
        self.output.extend_from_slice(&unit.payload);
        self.output
            .extend_from_slice(format!("@{:?}", unit.composition_time).as_bytes());
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), MuxError> {
        self.check(MuxStage::Trailer)?;
        self.output.extend_from_slice(b"|END");
        Ok(())
    }

    fn into_output(self) -> BytesMut {
        self.output
    }
}
