//! Engine implementation: public surface, event routing and transitions.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ConfigFetcher, HttpConfigFetcher, ProtocolConfig};
use crate::core::audio::{
    AudioInputDevice, AudioInputPipeline, AudioOutputDevice, AudioOutputPipeline, FrameHandler,
    OpusCodecFactory,
};
use crate::core::mcp::{self, McpValue, ParamSchema, RpcOutcome, ToolRegistry};
use crate::core::protocol::{ClientMessage, ServerMessage, AUDIO_FRAME_DURATION_MS};
use crate::core::transport::{TransportEvent, TransportEventHandler, WsTransport};
use crate::core::wake::{EnergyFrontEnd, WakeDetector, WakeWordFrontEnd};
use crate::tasks::ActiveTaskQueue;

use super::events::{ChatRole, Event, Observer};
use super::state::{ChatState, State};

const DEFAULT_OTA_URL: &str = "https://api.tenclass.net/xiaozhi/ota/";
const DEFAULT_WEBSOCKET_URL: &str = "wss://api.tenclass.net/xiaozhi/v1/";
const DEFAULT_WAKE_PHRASE: &str = "你好小智";

/// Frames are dropped once the network queue is deeper than this, unless the
/// host raises or disables the limit.
const DEFAULT_DROP_THRESHOLD: usize = 5;

/// The conversational session engine.
///
/// One engine per process is the intended usage; nothing enforces it, but the
/// engine assumes it is the sole owner of the audio devices handed to
/// [`Engine::start`].
///
/// Configuration calls are accepted only in the idle state and silently
/// ignored afterwards, so host setup code can run unconditionally. Every
/// post-start call enqueues work and returns immediately.
pub struct Engine {
    shared: Arc<Shared>,
}

struct Shared {
    /// UUIDv4 minted at construction; OTA device identity and `Client-Id`.
    client_id: String,
    state: Mutex<Inner>,
    engine_queue: ActiveTaskQueue,
    network_queue: ActiveTaskQueue,
    runtime: tokio::runtime::Runtime,
}

struct Inner {
    state: State,
    chat_state: ChatState,
    observer: Option<Arc<dyn Observer>>,
    ota_url: String,
    websocket_url: String,
    websocket_headers: BTreeMap<String, String>,
    device_id: String,
    wake_phrase: String,
    wake_front_end: Option<Box<dyn WakeWordFrontEnd>>,
    drop_threshold: Option<usize>,
    fetcher: Arc<dyn ConfigFetcher>,
    tools: ToolRegistry,
    session_id: String,
    pending_tool_calls: HashSet<i64>,
    input_device: Option<Arc<dyn AudioInputDevice>>,
    output_device: Option<Arc<dyn AudioOutputDevice>>,
    codec: Option<Arc<dyn OpusCodecFactory>>,
    transport: Option<Arc<WsTransport>>,
    input_pipeline: Option<AudioInputPipeline>,
    output_pipeline: Option<Arc<AudioOutputPipeline>>,
    wake: Option<Arc<WakeDetector>>,
}

impl Engine {
    pub fn new() -> Self {
        let client_id = Uuid::new_v4();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("aivox-io")
            .enable_all()
            .build()
            .expect("building the engine runtime");

        Self {
            shared: Arc::new(Shared {
                client_id: client_id.to_string(),
                state: Mutex::new(Inner {
                    state: State::Idle,
                    chat_state: ChatState::Idle,
                    observer: None,
                    ota_url: DEFAULT_OTA_URL.to_owned(),
                    websocket_url: DEFAULT_WEBSOCKET_URL.to_owned(),
                    websocket_headers: BTreeMap::from([(
                        "Authorization".to_owned(),
                        "Bearer test-token".to_owned(),
                    )]),
                    device_id: mac_style_device_id(&client_id),
                    wake_phrase: DEFAULT_WAKE_PHRASE.to_owned(),
                    wake_front_end: None,
                    drop_threshold: Some(DEFAULT_DROP_THRESHOLD),
                    fetcher: Arc::new(HttpConfigFetcher::new()),
                    tools: ToolRegistry::new(),
                    session_id: String::new(),
                    pending_tool_calls: HashSet::new(),
                    input_device: None,
                    output_device: None,
                    codec: None,
                    transport: None,
                    input_pipeline: None,
                    output_pipeline: None,
                    wake: None,
                }),
                engine_queue: ActiveTaskQueue::new("aivox-engine"),
                network_queue: ActiveTaskQueue::new("aivox-network"),
                runtime,
            }),
        }
    }

    /// Install the observer receiving engine events. Idle-only.
    pub fn set_observer(&self, observer: Arc<dyn Observer>) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.observer = Some(observer);
    }

    /// Override the OTA configuration endpoint. Idle-only.
    pub fn set_ota_url(&self, url: impl Into<String>) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.ota_url = url.into();
    }

    /// Set the WebSocket endpoint and merge extra request headers. Idle-only.
    pub fn configure_websocket(
        &self,
        url: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.websocket_url = url.into();
        for (key, value) in headers {
            inner.websocket_headers.insert(key, value);
        }
    }

    /// Set the stable device identity sent as `Device-Id`. Idle-only.
    pub fn set_device_id(&self, device_id: impl Into<String>) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.device_id = device_id.into();
    }

    /// Configure the wake phrase and acoustic front end. Idle-only.
    pub fn configure_wake_word(
        &self,
        phrase: impl Into<String>,
        front_end: Box<dyn WakeWordFrontEnd>,
    ) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.wake_phrase = phrase.into();
        inner.wake_front_end = Some(front_end);
    }

    /// Replace the configuration fetcher. Idle-only.
    pub fn set_config_fetcher(&self, fetcher: Arc<dyn ConfigFetcher>) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.fetcher = fetcher;
    }

    /// Tune the audio backpressure limit; `None` disables frame dropping.
    /// Idle-only.
    pub fn set_drop_threshold(&self, threshold: Option<usize>) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.drop_threshold = threshold;
    }

    /// Register an MCP tool. Idle-only; the registry freezes on start.
    pub fn add_mcp_tool(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        params: BTreeMap<String, ParamSchema>,
    ) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        inner.tools.add(name, description, params);
    }

    /// Leave `Idle`: arm the wake detector and fetch the protocol
    /// configuration. Ignored unless the engine is idle.
    pub fn start(
        &self,
        audio_input: Arc<dyn AudioInputDevice>,
        audio_output: Arc<dyn AudioOutputDevice>,
        codec: Arc<dyn OpusCodecFactory>,
    ) {
        let mut inner = self.shared.state.lock();
        if inner.state != State::Idle {
            return;
        }
        info!(tools = inner.tools.len(), "starting session engine");

        inner.input_device = Some(Arc::clone(&audio_input));
        inner.output_device = Some(audio_output);
        inner.codec = Some(codec);

        let shared = Arc::downgrade(&self.shared);
        let handler: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
            if let Some(shared) = shared.upgrade() {
                enqueue_engine(&shared, |shared| on_wake(shared));
            }
        });
        let front_end = inner
            .wake_front_end
            .take()
            .unwrap_or_else(|| Box::new(EnergyFrontEnd::default()));
        let wake = Arc::new(WakeDetector::new(audio_input, front_end, handler));
        wake.start();
        inner.wake = Some(wake);

        change_state(&mut inner, State::Initted);
        change_state(&mut inner, State::LoadingProtocol);
        enqueue_load_protocol(&self.shared);
    }

    /// Move to the next sensible state: retry a failed load, connect from
    /// standby, hang up while listening, abort while speaking.
    pub fn advance(&self) {
        if self.shared.state.lock().state == State::Idle {
            return;
        }
        enqueue_engine(&self.shared, |shared| advance_internal(shared));
    }

    /// Send a raw text frame over the conversation channel.
    pub fn send_text(&self, text: impl Into<String>) {
        let inner = self.shared.state.lock();
        if inner.state == State::Idle {
            return;
        }
        send_text_frame(&self.shared, &inner, text.into());
    }

    /// Answer an outstanding tool call with a value.
    pub fn send_mcp_call_response(&self, id: i64, value: impl Into<McpValue>) {
        if self.shared.state.lock().state == State::Idle {
            return;
        }
        let value = value.into();
        enqueue_engine(&self.shared, move |shared| {
            let mut inner = shared.state.lock();
            if !inner.pending_tool_calls.remove(&id) {
                warn!(id, "dropping response for a tool call that is not outstanding");
                return;
            }
            send_mcp_payload(shared, &inner, mcp::call_response(id, &value));
        });
    }

    /// Answer an outstanding tool call with an error.
    pub fn send_mcp_call_error(&self, id: i64, message: impl Into<String>) {
        if self.shared.state.lock().state == State::Idle {
            return;
        }
        let message = message.into();
        enqueue_engine(&self.shared, move |shared| {
            let mut inner = shared.state.lock();
            if !inner.pending_tool_calls.remove(&id) {
                warn!(id, "dropping error for a tool call that is not outstanding");
                return;
            }
            send_mcp_payload(shared, &inner, mcp::call_error(id, &message));
        });
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Format the first bytes of a UUID as a MAC-style device id.
fn mac_style_device_id(uuid: &Uuid) -> String {
    let b = uuid.as_bytes();
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5]
    )
}

/// Run `f` on the engine queue, skipping it if the engine is already gone.
fn enqueue_engine<F>(shared: &Arc<Shared>, f: F)
where
    F: FnOnce(&Arc<Shared>) + Send + 'static,
{
    let weak = Arc::downgrade(shared);
    shared.engine_queue.enqueue(move || {
        if let Some(shared) = weak.upgrade() {
            f(&shared);
        }
    });
}

fn push_event(inner: &Inner, event: Event) {
    if let Some(observer) = &inner.observer {
        observer.push_event(event);
    }
}

fn change_state(inner: &mut Inner, new_state: State) {
    let new_chat_state = new_state.chat_state();
    debug!(from = ?inner.state, to = ?new_state, "state transition");
    if new_chat_state != inner.chat_state {
        push_event(
            inner,
            Event::StateChanged {
                old: inner.chat_state,
                new: new_chat_state,
            },
        );
    }
    inner.state = new_state;
    inner.chat_state = new_chat_state;
}

fn encode(message: &ClientMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            error!(error = %e, "failed to serialise control frame");
            None
        }
    }
}

/// Hand a text frame to the network queue. The transport known at enqueue
/// time is captured so a reconnect cannot misroute stale frames.
fn send_text_frame(shared: &Shared, inner: &Inner, text: String) {
    let Some(transport) = inner.transport.clone() else {
        debug!("no transport, dropping outbound frame");
        return;
    };
    shared.network_queue.enqueue(move || {
        if !transport.is_connected() {
            return;
        }
        if let Err(e) = transport.send_text(text) {
            error!(error = %e, "sending text frame failed");
        }
    });
}

fn send_mcp_payload(shared: &Shared, inner: &Inner, payload: Value) {
    if let Some(json) = encode(&ClientMessage::mcp(&inner.session_id, payload)) {
        send_text_frame(shared, inner, json);
    }
}

fn enqueue_load_protocol(shared: &Arc<Shared>) {
    let weak = Arc::downgrade(shared);
    shared.network_queue.enqueue(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let (url, fetcher) = {
            let inner = shared.state.lock();
            (inner.ota_url.clone(), Arc::clone(&inner.fetcher))
        };
        let config = shared
            .runtime
            .block_on(fetcher.fetch(&url, &shared.client_id));
        enqueue_engine(&shared, move |shared| on_protocol_loaded(shared, config));
    });
}

fn on_protocol_loaded(shared: &Arc<Shared>, config: Option<ProtocolConfig>) {
    let mut inner = shared.state.lock();
    if inner.state != State::LoadingProtocol {
        warn!(state = ?inner.state, "config arrived outside of loading");
        return;
    }

    let Some(config) = config else {
        change_state(&mut inner, State::LoadingProtocolFailed);
        return;
    };

    if !config.mqtt.endpoint.is_empty() {
        // Captured for future transports; this engine only speaks WebSocket.
        debug!(endpoint = %config.mqtt.endpoint, client_id = %config.mqtt.client_id, "mqtt config present");
    }

    if config.needs_activation() {
        info!(code = %config.activation.code, "device requires activation");
        push_event(
            &inner,
            Event::Activation {
                code: config.activation.code,
                message: config.activation.message,
            },
        );
        change_state(&mut inner, State::Initted);
        return;
    }

    change_state(&mut inner, State::Standby);
}

fn advance_internal(shared: &Arc<Shared>) {
    let mut inner = shared.state.lock();
    debug!(state = ?inner.state, "advance");
    match inner.state {
        State::Initted | State::LoadingProtocolFailed => {
            change_state(&mut inner, State::LoadingProtocol);
            enqueue_load_protocol(shared);
        }
        State::Standby => {
            if connect_websocket(shared, &mut inner) {
                change_state(&mut inner, State::WsConnecting);
            }
        }
        State::Listening => {
            disconnect_websocket(shared, &mut inner);
        }
        State::Speaking => {
            abort_speaking(shared, &mut inner, None);
        }
        _ => {}
    }
}

fn on_wake(shared: &Arc<Shared>) {
    let mut inner = shared.state.lock();
    info!(state = ?inner.state, "wake event");
    match inner.state {
        State::Initted | State::LoadingProtocolFailed => {
            change_state(&mut inner, State::LoadingProtocol);
            enqueue_load_protocol(shared);
        }
        State::Standby => {
            if connect_websocket(shared, &mut inner) {
                change_state(&mut inner, State::WsConnectingWithWake);
            }
        }
        State::Speaking => {
            abort_speaking(shared, &mut inner, Some("wake_word_detected"));
        }
        _ => {}
    }

    // The detector disarms itself after firing; it keeps watching in every
    // state where the microphone is not owned by the input pipeline.
    if inner.state != State::Listening {
        if let Some(wake) = &inner.wake {
            wake.start();
        }
    }
}

fn connect_websocket(shared: &Arc<Shared>, inner: &mut Inner) -> bool {
    if inner.state != State::Standby {
        error!(state = ?inner.state, "connect attempted outside standby");
        return false;
    }

    let weak = Arc::downgrade(shared);
    let handler: TransportEventHandler = Arc::new(move |event| {
        if let Some(shared) = weak.upgrade() {
            enqueue_engine(&shared, move |shared| on_transport_event(shared, event));
        }
    });

    let transport = WsTransport::new(
        inner.websocket_url.clone(),
        inner.websocket_headers.clone(),
        inner.device_id.clone(),
        shared.client_id.clone(),
        shared.runtime.handle().clone(),
        handler,
    );
    info!(url = %inner.websocket_url, "starting websocket client");
    match transport.connect() {
        Ok(()) => {
            inner.transport = Some(transport);
            true
        }
        Err(e) => {
            error!(error = %e, "failed to start websocket client");
            false
        }
    }
}

fn disconnect_websocket(shared: &Arc<Shared>, inner: &mut Inner) {
    inner.input_pipeline = None;
    inner.output_pipeline = None;
    if let Some(wake) = &inner.wake {
        wake.start();
    }
    if let Some(transport) = inner.transport.clone() {
        // The network queue is the only caller of the transport; the
        // `Standby` transition follows from the Disconnected event.
        shared.network_queue.enqueue(move || transport.close());
    }
}

fn on_transport_event(shared: &Arc<Shared>, event: TransportEvent) {
    match event {
        TransportEvent::Connected => on_ws_connected(shared),
        TransportEvent::Disconnected => on_ws_disconnected(shared),
        TransportEvent::TextFrame(text) => on_text_frame(shared, text),
        TransportEvent::BinaryFrame(frame) => on_audio_frame(shared, frame),
        TransportEvent::Error(message) => {
            warn!(error = %message, "websocket error");
        }
    }
}

fn on_ws_connected(shared: &Arc<Shared>) {
    let mut inner = shared.state.lock();
    match inner.state {
        State::WsConnecting => change_state(&mut inner, State::WsConnected),
        State::WsConnectingWithWake => change_state(&mut inner, State::WsConnectedWithWake),
        _ => {
            error!(state = ?inner.state, "websocket connected in unexpected state");
            return;
        }
    }
    if let Some(json) = encode(&ClientMessage::hello()) {
        send_text_frame(shared, &inner, json);
    }
}

fn on_ws_disconnected(shared: &Arc<Shared>) {
    let mut inner = shared.state.lock();
    if !matches!(
        inner.state,
        State::WsConnecting
            | State::WsConnectingWithWake
            | State::WsConnected
            | State::WsConnectedWithWake
            | State::Listening
            | State::Speaking
    ) {
        debug!(state = ?inner.state, "disconnect in non-connected state");
        return;
    }
    info!("websocket disconnected");

    inner.input_pipeline = None;
    inner.output_pipeline = None;
    inner.transport = None;
    inner.session_id.clear();
    inner.pending_tool_calls.clear();
    if let Some(wake) = &inner.wake {
        wake.start();
    }
    change_state(&mut inner, State::Standby);
}

fn on_audio_frame(shared: &Arc<Shared>, frame: Bytes) {
    let inner = shared.state.lock();
    if let Some(pipeline) = &inner.output_pipeline {
        pipeline.write(frame);
    }
}

fn on_text_frame(shared: &Arc<Shared>, text: String) {
    let mut inner = shared.state.lock();
    push_event(
        &inner,
        Event::TextReceived {
            content: text.clone(),
        },
    );

    let message: ServerMessage = match serde_json::from_str(&text) {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "dropping malformed control frame");
            return;
        }
    };

    match message {
        ServerMessage::Hello { session_id } => {
            let with_wake = match inner.state {
                State::WsConnected => false,
                State::WsConnectedWithWake => true,
                _ => {
                    error!(state = ?inner.state, "server hello in invalid state");
                    return;
                }
            };
            if let Some(session_id) = session_id {
                info!(%session_id, "session established");
                inner.session_id = session_id;
            }
            start_listening(shared, &mut inner);
            if with_wake {
                let detect =
                    ClientMessage::listen_detect(&inner.session_id, &inner.wake_phrase);
                if let Some(json) = encode(&detect) {
                    send_text_frame(shared, &inner, json);
                }
            }
        }
        ServerMessage::Goodbye { session_id } => {
            if let Some(session_id) = session_id {
                if session_id != inner.session_id {
                    warn!(%session_id, current = %inner.session_id, "ignoring goodbye for another session");
                }
            }
            // Teardown follows from the close the server performs next.
        }
        ServerMessage::Tts { state, text } => on_tts(shared, &mut inner, &state, text),
        ServerMessage::Stt { text } => {
            if let Some(text) = text {
                info!(">> {text}");
                push_event(
                    &inner,
                    Event::ChatMessage {
                        role: ChatRole::User,
                        content: text,
                    },
                );
            }
        }
        ServerMessage::Llm { emotion } => {
            if let Some(emotion) = emotion {
                push_event(&inner, Event::Emotion { emotion });
            }
        }
        ServerMessage::Mcp { payload } => match mcp::handle_request(&inner.tools, &payload) {
            RpcOutcome::Reply(reply) => send_mcp_payload(shared, &inner, reply),
            RpcOutcome::ToolCall { id, name, params } => {
                inner.pending_tool_calls.insert(id);
                push_event(&inner, Event::McpToolCall { id, name, params });
            }
            RpcOutcome::Ignored => {}
        },
        ServerMessage::Unknown => {
            warn!(frame = %text, "ignoring control frame of unknown type");
        }
    }
}

fn on_tts(shared: &Arc<Shared>, inner: &mut Inner, state: &str, text: Option<String>) {
    match state {
        "start" => {
            if inner.state == State::Speaking {
                warn!("tts start while already speaking");
                return;
            }
            if inner.state != State::Listening {
                warn!(state = ?inner.state, "tts start in invalid state");
                return;
            }
            let (Some(device), Some(codec)) =
                (inner.output_device.clone(), inner.codec.clone())
            else {
                error!("no output device or codec configured");
                return;
            };
            inner.input_pipeline = None;
            if let Some(wake) = &inner.wake {
                wake.start();
            }
            inner.output_pipeline = Some(Arc::new(AudioOutputPipeline::new(
                device,
                codec.new_decoder(),
            )));
            change_state(inner, State::Speaking);
        }
        "stop" => {
            // No active pipeline: nothing to drain, nothing to do.
            if let Some(pipeline) = &inner.output_pipeline {
                let weak = Arc::downgrade(shared);
                pipeline.notify_data_end(move || {
                    if let Some(shared) = weak.upgrade() {
                        enqueue_engine(&shared, |shared| on_output_drained(shared));
                    }
                });
            }
        }
        "sentence_start" => {
            if let Some(text) = text {
                info!("<< {text}");
                push_event(
                    inner,
                    Event::ChatMessage {
                        role: ChatRole::Assistant,
                        content: text,
                    },
                );
            }
        }
        "sentence_end" => {}
        other => {
            debug!(state = other, "ignoring tts state");
        }
    }
}

fn on_output_drained(shared: &Arc<Shared>) {
    let mut inner = shared.state.lock();
    if inner.state != State::Speaking {
        debug!(state = ?inner.state, "drain outside speaking");
        return;
    }
    start_listening(shared, &mut inner);
}

fn start_listening(shared: &Arc<Shared>, inner: &mut Inner) {
    if !matches!(
        inner.state,
        State::WsConnected | State::WsConnectedWithWake | State::Speaking
    ) {
        info!(state = ?inner.state, "not a listening entry state");
        return;
    }

    if let Some(json) = encode(&ClientMessage::listen_start(&inner.session_id)) {
        send_text_frame(shared, inner, json);
    }

    // Release the speaker path and the wake detector before the microphone
    // pipeline takes the input device.
    inner.output_pipeline = None;
    if let Some(wake) = &inner.wake {
        wake.stop();
    }

    let (Some(device), Some(codec)) = (inner.input_device.clone(), inner.codec.clone()) else {
        error!("no input device or codec configured");
        return;
    };

    let weak = Arc::downgrade(shared);
    let drop_threshold = inner.drop_threshold;
    let handler: FrameHandler = Arc::new(move |frame: Bytes| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if should_drop_frame(shared.network_queue.len(), drop_threshold) {
            debug!("network queue congested, dropping audio frame");
            return;
        }
        let weak = Arc::downgrade(&shared);
        shared.network_queue.enqueue(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let transport = shared.state.lock().transport.clone();
            let Some(transport) = transport else {
                return;
            };
            if !transport.is_connected() {
                return;
            }
            if let Err(e) = transport.send_binary(frame) {
                error!(error = %e, "sending audio frame failed");
            }
        });
    });

    inner.input_pipeline = Some(AudioInputPipeline::new(
        device,
        codec.new_encoder(),
        handler,
        AUDIO_FRAME_DURATION_MS,
    ));
    change_state(inner, State::Listening);
}

fn abort_speaking(shared: &Arc<Shared>, inner: &mut Inner, reason: Option<&str>) {
    if inner.state != State::Speaking {
        error!(state = ?inner.state, "abort outside speaking");
        return;
    }
    if let Some(json) = encode(&ClientMessage::abort(&inner.session_id, reason)) {
        send_text_frame(shared, inner, json);
    }
}

/// Backpressure policy for upstream audio: favour freshness over delivery
/// once the network queue backs up.
fn should_drop_frame(queue_depth: usize, threshold: Option<usize>) -> bool {
    match threshold {
        Some(limit) => queue_depth > limit,
        None => false,
    }
}
