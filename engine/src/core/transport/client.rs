//! WebSocket client built on `tokio-tungstenite`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::handshake::client::generate_key;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Deadline for outbound text frames.
const TEXT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for outbound binary (audio) frames.
const BINARY_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Deadline for the closing handshake on teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends slower than this log a poor-network warning.
const SLOW_SEND_WARN: Duration = Duration::from_millis(100);

/// Errors surfaced by the WebSocket adapter.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured URL is not a usable WebSocket endpoint
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),

    /// Handshake request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No connection is established
    #[error("not connected")]
    NotConnected,

    /// A send did not complete within its deadline
    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),

    /// WebSocket protocol or I/O error
    #[error("websocket error: {0}")]
    WebSocket(String),
}

/// Events dispatched by the adapter.
///
/// Dispatch happens on transport-internal tasks; handlers must not block and
/// should do nothing beyond enqueueing work elsewhere.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    TextFrame(String),
    BinaryFrame(Bytes),
    Error(String),
}

pub type TransportEventHandler = Arc<dyn Fn(TransportEvent) + Send + Sync>;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A single client connection to the conversational endpoint.
///
/// `connect` is asynchronous: it validates the configuration, spawns the
/// connection driver on the engine runtime and returns; the outcome arrives
/// as a `Connected` or `Error`/`Disconnected` event. Sends are synchronous
/// with per-kind deadlines and are meant to be called from the network queue.
pub struct WsTransport {
    url: String,
    headers: BTreeMap<String, String>,
    device_id: String,
    client_id: String,
    handler: TransportEventHandler,
    runtime: Handle,
    sink: Arc<Mutex<Option<WsSink>>>,
    connected: Arc<AtomicBool>,
}

impl WsTransport {
    pub fn new(
        url: String,
        headers: BTreeMap<String, String>,
        device_id: String,
        client_id: String,
        runtime: Handle,
        handler: TransportEventHandler,
    ) -> Arc<Self> {
        Arc::new(Self {
            url,
            headers,
            device_id,
            client_id,
            handler,
            runtime,
            sink: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Start connecting. Returns immediately once the handshake request is
    /// validated; progress is reported through the event handler.
    pub fn connect(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Ok(());
        }
        let request = self.build_request()?;

        let url = self.url.clone();
        let sink_slot = Arc::clone(&self.sink);
        let connected = Arc::clone(&self.connected);
        let handler = Arc::clone(&self.handler);
        self.runtime.spawn(async move {
            match connect_async(request).await {
                Ok((stream, response)) => {
                    info!(%url, status = %response.status(), "websocket connected");
                    let (sink, stream) = stream.split();
                    *sink_slot.lock().await = Some(sink);
                    connected.store(true, Ordering::SeqCst);
                    handler(TransportEvent::Connected);
                    read_loop(stream, &sink_slot, &connected, &handler).await;
                }
                Err(e) => {
                    error!(%url, error = %e, "websocket connect failed");
                    handler(TransportEvent::Error(e.to_string()));
                    handler(TransportEvent::Disconnected);
                }
            }
        });
        Ok(())
    }

    /// Send a JSON control frame. Blocks the calling thread up to the text
    /// deadline.
    pub fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.send(Message::Text(text), TEXT_SEND_TIMEOUT)
    }

    /// Send a binary audio frame. Blocks the calling thread up to the binary
    /// deadline.
    pub fn send_binary(&self, frame: Bytes) -> Result<(), TransportError> {
        self.send(Message::Binary(frame.to_vec()), BINARY_SEND_TIMEOUT)
    }

    /// Begin the closing handshake. The `Disconnected` event fires when the
    /// read loop observes the close.
    pub fn close(&self) {
        let sink = Arc::clone(&self.sink);
        self.runtime.block_on(async move {
            let mut guard = sink.lock().await;
            if let Some(sink) = guard.as_mut() {
                if tokio::time::timeout(CLOSE_TIMEOUT, sink.send(Message::Close(None)))
                    .await
                    .is_err()
                {
                    warn!("websocket close handshake timed out");
                }
            }
        });
    }

    fn send(&self, message: Message, deadline: Duration) -> Result<(), TransportError> {
        let size = message.len();
        let started = Instant::now();

        let sink = Arc::clone(&self.sink);
        let result = self.runtime.block_on(async move {
            let mut guard = sink.lock().await;
            let Some(sink) = guard.as_mut() else {
                return Err(TransportError::NotConnected);
            };
            match tokio::time::timeout(deadline, sink.send(message)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(TransportError::WebSocket(e.to_string())),
                Err(_) => Err(TransportError::SendTimeout(deadline)),
            }
        });

        let elapsed = started.elapsed();
        if elapsed > SLOW_SEND_WARN {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                bytes = size,
                "network latency high, poor network condition detected"
            );
        }
        result
    }

    fn build_request(&self) -> Result<http::Request<()>, TransportError> {
        let parsed =
            url::Url::parse(&self.url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| TransportError::InvalidUrl("missing host".to_owned()))?;
        let host_header = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        let mut builder = http::Request::builder()
            .uri(self.url.as_str())
            .header("Host", host_header)
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", generate_key());
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder = builder
            .header("Protocol-Version", "1")
            .header("Device-Id", self.device_id.as_str())
            .header("Client-Id", self.client_id.as_str());

        builder
            .body(())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

async fn read_loop(
    mut stream: WsStream,
    sink_slot: &Arc<Mutex<Option<WsSink>>>,
    connected: &Arc<AtomicBool>,
    handler: &TransportEventHandler,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handler(TransportEvent::TextFrame(text));
            }
            Ok(Message::Binary(data)) => {
                handler(TransportEvent::BinaryFrame(Bytes::from(data)));
            }
            Ok(Message::Ping(payload)) => {
                let mut guard = sink_slot.lock().await;
                if let Some(sink) = guard.as_mut() {
                    if let Err(e) = sink.send(Message::Pong(payload)).await {
                        warn!(error = %e, "failed to answer ping");
                    }
                }
            }
            Ok(Message::Pong(_)) => {}
            Ok(Message::Close(frame)) => {
                debug!(?frame, "websocket closed by peer");
                break;
            }
            Ok(Message::Frame(_)) => {
                // Raw frames only surface here when reassembly is off or
                // broken; partial frames are a hard protocol violation for
                // this client.
                error!("received a fragmented websocket frame; fragmented frames are not supported");
                handler(TransportEvent::Error(
                    "fragmented frames are not supported".to_owned(),
                ));
                break;
            }
            Err(e) => {
                error!(error = %e, "websocket read error");
                handler(TransportEvent::Error(e.to_string()));
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    *sink_slot.lock().await = None;
    handler(TransportEvent::Disconnected);
}
