//! Wire protocol codec for the conversational text channel.
//!
//! One WebSocket carries two kinds of traffic: binary frames (Opus audio,
//! handled by the audio pipelines) and text frames holding JSON control
//! messages. This module owns the JSON side — the outbound frames the engine
//! produces and the inbound frames it dispatches on.

mod messages;

pub use messages::{AudioParams, ClientMessage, Features, ServerMessage};

/// Negotiated protocol version sent in the `hello` frame.
pub const PROTOCOL_VERSION: u32 = 1;

/// Audio parameters advertised in the `hello` frame.
pub const AUDIO_FORMAT: &str = "opus";
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;
pub const AUDIO_CHANNELS: u32 = 1;
pub const AUDIO_FRAME_DURATION_MS: u32 = 60;
