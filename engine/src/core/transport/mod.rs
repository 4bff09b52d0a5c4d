//! WebSocket adapter.
//!
//! Connects to the conversational endpoint, multiplexes JSON text frames and
//! binary Opus frames on one socket, and dispatches connection events into a
//! caller-supplied handler. The adapter knows nothing about the protocol it
//! carries; the session engine interprets the frames.

mod client;

pub use client::{TransportError, TransportEvent, TransportEventHandler, WsTransport};
