//! The session engine.
//!
//! A single long-lived [`Engine`] coordinates everything: it owns the two
//! task queues (engine and network), the WebSocket transport, both audio
//! pipelines and the wake detector, and it is the only writer of the session
//! state. Host-facing configuration is accepted only while the engine is
//! `Idle`; every post-start entry point enqueues work and returns.
//!
//! Foreign threads (transport tasks, wake detector, audio pipelines, the
//! config fetch) never touch state directly: each callback enqueues one typed
//! event onto the engine queue and the engine thread decides all transitions.

mod events;
mod session;
mod state;

pub use events::{ChatRole, Event, EventQueue, Observer, MAX_EVENT_QUEUE};
pub use session::Engine;
pub use state::ChatState;
