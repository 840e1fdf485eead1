//! Synthetic feed demo
//!
//! Drives a session registry with an in-process transport that generates a
//! 25 fps video stream with a keyframe every 2 seconds, then prints the
//! playlist and the size of each segment.
//!
//! Run with: cargo run --example synthetic_feed [SECONDS]
//!
//! Set `RUST_LOG=rtsp_hls=debug` to watch segments being cut.

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use rtsp_hls::{
    Codec, CodecData, CodecDescription, ConnectOptions, Connection, MediaUnit,
    MuxError, Muxer, SegmentWriter, SessionRegistry, Transport, TransportError, TransportEvent,
};

const FRAME_INTERVAL: Duration = Duration::from_millis(40);
const FRAMES_PER_GOP: u64 = 50;

/// Transport that fabricates frames instead of dialing anything
struct SyntheticTransport;

struct SyntheticConnection {
    events: mpsc::Receiver<TransportEvent>,
    generator: tokio::task::JoinHandle<()>,
}

impl Transport for SyntheticTransport {
    type Connection = SyntheticConnection;

    async fn connect(
        &self,
        address: &str,
        options: ConnectOptions,
    ) -> Result<SyntheticConnection, TransportError> {
        if !address.starts_with("synthetic://") {
            return Err(TransportError::Rejected(format!(
                "unsupported scheme: {}",
                address
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let generator = tokio::spawn(generate(tx, !options.disable_audio));

        Ok(SyntheticConnection {
            events: rx,
            generator,
        })
    }
}

async fn generate(tx: mpsc::Sender<TransportEvent>, with_audio: bool) {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);

    for frame in 0u64.. {
        ticker.tick().await;

        let timestamp = FRAME_INTERVAL * frame as u32;
        let is_keyframe = frame % FRAMES_PER_GOP == 0;
        let payload = Bytes::from(vec![frame as u8; if is_keyframe { 4096 } else { 512 }]);

        let video = MediaUnit::video(timestamp, payload, is_keyframe);
        if tx.send(TransportEvent::Unit(video)).await.is_err() {
            return;
        }

        if with_audio && frame % 2 == 0 {
            let audio = MediaUnit::audio(timestamp, Bytes::from_static(&[0xAA; 128]));
            if tx.send(TransportEvent::Unit(audio)).await.is_err() {
                return;
            }
        }
    }
}

impl Connection for SyntheticConnection {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    fn codec_description(&self) -> CodecDescription {
        CodecDescription::new(vec![
            CodecData::new(Codec::H264, Bytes::from_static(&[0x01, 0x64, 0x00, 0x1f])),
            CodecData::new(Codec::Aac, Bytes::from_static(&[0x12, 0x10])),
        ])
    }

    async fn close(&mut self) {
        self.generator.abort();
    }
}

/// Length-prefixed dump of the units, standing in for an MPEG-TS muxer
struct DumpMuxer;

struct DumpWriter {
    output: BytesMut,
}

impl Muxer for DumpMuxer {
    type Writer = DumpWriter;

    fn new_writer(&self, output: BytesMut) -> DumpWriter {
        DumpWriter { output }
    }
}

impl SegmentWriter for DumpWriter {
    fn write_header(&mut self, codecs: &CodecDescription) -> Result<(), MuxError> {
        self.output.put_u8(codecs.streams().len() as u8);
        Ok(())
    }

    fn write_unit(&mut self, unit: &MediaUnit) -> Result<(), MuxError> {
        self.output.put_u8(unit.is_video() as u8);
        self.output.put_u32(unit.payload.len() as u32);
        self.output.put_slice(&unit.payload);
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), MuxError> {
        Ok(())
    }

    fn into_output(self) -> BytesMut {
        self.output
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtsp_hls=info".parse()?)
                .add_directive("synthetic_feed=info".parse()?),
        )
        .init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(13);

    let registry = Arc::new(SessionRegistry::new(
        Arc::new(SyntheticTransport),
        Arc::new(DumpMuxer),
    ));
    let mut events = registry.subscribe();

    let session = registry.open("synthetic://camera-1/live").await?;
    tracing::info!(session_id = %session.id(), "Opened session");

    let playlist = session.playlist("/hls/camera-1/").await?;
    println!("First playlist:\n{}", playlist);

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    let playlist = session.playlist("/hls/camera-1/").await?;
    println!("Playlist after {}s:\n{}", seconds, playlist);

    for sequence in session.sequences() {
        let bytes = session.segment(&format!("{}.ts", sequence))?;
        println!("segment {:>3}: {:>7} bytes", sequence, bytes.len());
    }

    let info = session.info();
    println!(
        "stats: {} units, {} keyframes, {} segments ({} evicted)",
        info.stats.units_received,
        info.stats.keyframes,
        info.stats.segments_produced,
        info.stats.segments_evicted
    );

    registry.shutdown().await;
    if let Ok(event) = events.recv().await {
        tracing::info!(?event, "Lifecycle event");
    }

    // A source the transport refuses never gets registered
    if let Err(e) = registry.open("rtsp://unreachable/stream").await {
        tracing::warn!(error = %e, "Open failed as expected");
    }
    println!("registered sessions: {}", registry.len());

    Ok(())
}
