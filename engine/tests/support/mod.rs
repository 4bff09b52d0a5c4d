//! Shared fixtures: an in-process WebSocket server, fake audio hardware, a
//! passthrough codec and a scripted config fetcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use aivox_engine::core::audio::{
    AudioInputDevice, AudioOutputDevice, OpusCodecFactory, OpusDecoder, OpusEncoder,
};
use aivox_engine::{CodecError, ConfigFetcher, Event, EventQueue, ProtocolConfig};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Opt-in test logging: `RUST_LOG=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Single-connection WebSocket server driven from a plain test thread.
///
/// The server runs its own current-thread runtime so tests stay synchronous
/// and the engine can be dropped without an ambient async context.
pub struct MockWsServer {
    pub url: String,
    to_client: mpsc::Sender<Message>,
    from_client: mpsc::Receiver<Message>,
}

impl MockWsServer {
    pub fn start() -> Self {
        let (url_tx, url_rx) = mpsc::channel();
        let (to_client, outbound) = mpsc::channel::<Message>();
        let (inbound, from_client) = mpsc::channel::<Message>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("building mock server runtime");
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
                let addr = listener.local_addr().expect("local addr");
                url_tx.send(format!("ws://{addr}/")).expect("url channel");

                let (stream, _) = listener.accept().await.expect("accept");
                let ws = accept_async(stream).await.expect("handshake");
                let (mut write, mut read) = ws.split();

                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(5)) => {
                            loop {
                                match outbound.try_recv() {
                                    Ok(message) => {
                                        if write.send(message).await.is_err() {
                                            return;
                                        }
                                    }
                                    Err(mpsc::TryRecvError::Empty) => break,
                                    Err(mpsc::TryRecvError::Disconnected) => {
                                        let _ = write.send(Message::Close(None)).await;
                                        return;
                                    }
                                }
                            }
                        }
                        message = read.next() => match message {
                            Some(Ok(message)) => {
                                let _ = inbound.send(message);
                            }
                            _ => return,
                        },
                    }
                }
            });
        });

        Self {
            url: url_rx.recv().expect("server url"),
            to_client,
            from_client,
        }
    }

    pub fn send_json(&self, value: Value) {
        self.to_client
            .send(Message::Text(value.to_string()))
            .expect("server send");
    }

    pub fn send_binary(&self, frame: &[u8]) {
        self.to_client
            .send(Message::Binary(frame.to_vec()))
            .expect("server send");
    }

    /// Ask the server to run the closing handshake.
    pub fn close(&self) {
        let _ = self.to_client.send(Message::Close(None));
    }

    /// Next text frame with the given top-level `type`, skipping binary audio
    /// and unrelated frames.
    pub fn expect_frame(&self, frame_type: &str) -> Value {
        let deadline = Instant::now() + EVENT_TIMEOUT;
        while Instant::now() < deadline {
            match self.from_client.recv_timeout(Duration::from_millis(100)) {
                Ok(Message::Text(text)) => {
                    let value: Value =
                        serde_json::from_str(&text).expect("client sent invalid json");
                    if value["type"] == frame_type {
                        return value;
                    }
                }
                Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        panic!("no '{frame_type}' frame from client within {EVENT_TIMEOUT:?}");
    }

    /// Assert that no text frame of the given type arrives within `window`.
    pub fn expect_no_frame(&self, frame_type: &str, window: Duration) {
        let deadline = Instant::now() + window;
        while Instant::now() < deadline {
            if let Ok(Message::Text(text)) =
                self.from_client.recv_timeout(Duration::from_millis(50))
            {
                let value: Value = serde_json::from_str(&text).expect("client sent invalid json");
                assert_ne!(
                    value["type"], frame_type,
                    "unexpected '{frame_type}' frame: {value}"
                );
            }
        }
    }
}

/// Microphone fake: silence by default, loud on demand.
pub struct TestMic {
    loud: AtomicBool,
    stopped: AtomicBool,
}

impl TestMic {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            loud: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn go_loud(&self) {
        self.loud.store(true, Ordering::SeqCst);
    }

    pub fn go_quiet(&self) {
        self.loud.store(false, Ordering::SeqCst);
    }
}

impl AudioInputDevice for TestMic {
    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn read_pcm(&self, samples: usize) -> Vec<i16> {
        std::thread::sleep(Duration::from_millis(10));
        if self.stopped.swap(false, Ordering::SeqCst) {
            return Vec::new();
        }
        let level = if self.loud.load(Ordering::SeqCst) {
            12_000
        } else {
            0
        };
        vec![level; samples]
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Speaker fake recording every PCM write.
#[derive(Default)]
pub struct TestSpeaker {
    writes: Mutex<Vec<Vec<i16>>>,
}

impl TestSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn samples_written(&self) -> usize {
        self.writes.lock().iter().map(Vec::len).sum()
    }
}

impl AudioOutputDevice for TestSpeaker {
    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn write_pcm(&self, pcm: &[i16]) {
        self.writes.lock().push(pcm.to_vec());
    }
}

/// Codec fake: one encoded byte per non-zero flag, identity-ish decode.
pub struct TestCodec;

impl TestCodec {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

struct TestEncoder;

impl OpusEncoder for TestEncoder {
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError> {
        // Two marker bytes plus the sample count, enough to look like a packet.
        let mut frame = vec![0xA1, 0xA2];
        frame.extend_from_slice(&(pcm.len() as u32).to_be_bytes());
        Ok(Bytes::from(frame))
    }
}

struct TestDecoder;

impl OpusDecoder for TestDecoder {
    fn decode(&mut self, frame: &[u8]) -> Result<Vec<i16>, CodecError> {
        if frame.is_empty() {
            return Err(CodecError::Decode("empty frame".to_owned()));
        }
        Ok(frame.iter().map(|&b| i16::from(b)).collect())
    }
}

impl OpusCodecFactory for TestCodec {
    fn new_encoder(&self) -> Box<dyn OpusEncoder> {
        Box::new(TestEncoder)
    }

    fn new_decoder(&self) -> Box<dyn OpusDecoder> {
        Box::new(TestDecoder)
    }
}

/// Config fetcher answering from a canned document.
pub struct ScriptedFetcher {
    config: Option<ProtocolConfig>,
}

impl ScriptedFetcher {
    pub fn empty_activation() -> Arc<Self> {
        Arc::new(Self {
            config: Some(ProtocolConfig::default()),
        })
    }

    pub fn with_activation(code: &str, message: &str) -> Arc<Self> {
        let mut config = ProtocolConfig::default();
        config.activation.code = code.to_owned();
        config.activation.message = message.to_owned();
        Arc::new(Self {
            config: Some(config),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { config: None })
    }
}

#[async_trait]
impl ConfigFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str, _device_uuid: &str) -> Option<ProtocolConfig> {
        self.config.clone()
    }
}

/// Polls the bounded observer queue often enough that nothing is dropped and
/// keeps the full history for ordering assertions.
pub struct EventCollector {
    queue: Arc<EventQueue>,
    pub seen: Vec<Event>,
    cursor: usize,
}

impl EventCollector {
    pub fn new(queue: Arc<EventQueue>) -> Self {
        Self {
            queue,
            seen: Vec::new(),
            cursor: 0,
        }
    }

    /// Wait until an event matching `pred` arrives, returning it.
    ///
    /// Events are consumed: a later `wait_for` never re-matches an event an
    /// earlier call already scanned past, so waiting for the same state twice
    /// requires it to be entered twice.
    pub fn wait_for<F>(&mut self, what: &str, pred: F) -> Event
    where
        F: Fn(&Event) -> bool,
    {
        let deadline = Instant::now() + EVENT_TIMEOUT;
        while Instant::now() < deadline {
            self.seen.extend(self.queue.pop_events());
            while self.cursor < self.seen.len() {
                let index = self.cursor;
                self.cursor += 1;
                if pred(&self.seen[index]) {
                    return self.seen[index].clone();
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for {what}; saw {:#?}", self.seen);
    }

    /// Assert that no event matching `pred` arrives within `window`,
    /// counting only events newer than the call itself.
    pub fn expect_none<F>(&mut self, what: &str, window: Duration, pred: F)
    where
        F: Fn(&Event) -> bool,
    {
        let start = self.seen.len();
        let deadline = Instant::now() + window;
        while Instant::now() < deadline {
            self.seen.extend(self.queue.pop_events());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(
            !self.seen[start..].iter().any(pred),
            "unexpected {what}; saw {:#?}",
            &self.seen[start..]
        );
    }
}
