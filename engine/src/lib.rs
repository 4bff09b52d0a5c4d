//! Conversational session engine for full-duplex voice assistants.
//!
//! The engine sits between three worlds: a local microphone/speaker pair, a
//! remote AI service reached over a single WebSocket, and the host
//! application. It streams Opus upstream while listening, plays Opus
//! downstream while speaking, surfaces transcripts and model events to an
//! observer, and embeds an MCP (JSON-RPC 2.0) server inside the text channel
//! so the remote model can call host-registered tools.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐ wake  ┌───────────────────────────────┐
//! │ wake det │──────▶│                               │ events ┌──────────┐
//! └──────────┘       │        session engine         │───────▶│ observer │
//! ┌──────────┐ opus  │  (state machine, engine queue)│        └──────────┘
//! │ audio in │──────▶│                               │
//! └──────────┘       └──────┬────────────────▲───────┘
//! ┌──────────┐ pcm          │ network queue  │ frames
//! │ audio out│◀─────────────▼────────────────┴───────┐
//! └──────────┘       │        websocket transport    │
//!                    └───────────────────────────────┘
//! ```
//!
//! All engine state is mutated from a single consumer thread; foreign
//! callbacks (transport, wake, audio, config fetch) only enqueue typed events.

pub mod config;
pub mod core;
pub mod tasks;

pub use config::{ConfigFetcher, HttpConfigFetcher, MqttConfig, ProtocolConfig};
pub use core::audio::{
    AudioInputDevice, AudioOutputDevice, CodecError, OpusCodecFactory, OpusDecoder, OpusEncoder,
};
pub use core::engine::{ChatRole, ChatState, Engine, Event, EventQueue, Observer};
pub use core::mcp::{McpValue, ParamSchema, ToolRegistry};
pub use core::wake::{EnergyFrontEnd, WakeWordFrontEnd};
pub use tasks::{ActiveTaskQueue, PassiveTaskQueue};
