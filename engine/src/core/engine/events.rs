//! Observer events and the bounded event queue.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;

use crate::core::mcp::McpValue;

use super::ChatState;

/// Speaker role attached to transcript events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Assistant,
    User,
}

/// Everything the engine reports to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Raw inbound text frame, delivered before any parsing. Debug/audit hook.
    TextReceived { content: String },
    /// Reserved for translated transcripts; not emitted yet.
    TextTranslated { content: String },
    /// Host-visible state changed.
    StateChanged { old: ChatState, new: ChatState },
    /// Device needs activation; the session stays in `Initted`.
    Activation { code: String, message: String },
    /// A transcript line from either side of the conversation.
    ChatMessage { role: ChatRole, content: String },
    /// Emotion label attached to the assistant's reply.
    Emotion { emotion: String },
    /// The remote model called a registered tool; the host must answer via
    /// `send_mcp_call_response` or `send_mcp_call_error`.
    McpToolCall {
        id: i64,
        name: String,
        params: BTreeMap<String, McpValue>,
    },
}

/// Observer capability interface. `push_event` is called from the engine
/// thread and must not block.
pub trait Observer: Send + Sync {
    fn push_event(&self, event: Event);
}

/// Capacity of [`EventQueue`]; overflow drops the oldest event.
pub const MAX_EVENT_QUEUE: usize = 10;

/// Ready-made polling observer: a bounded FIFO the host drains at its own
/// pace.
#[derive(Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued event, oldest first.
    pub fn pop_events(&self) -> VecDeque<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl Observer for EventQueue {
    fn push_event(&self, event: Event) {
        let mut events = self.events.lock();
        if events.len() >= MAX_EVENT_QUEUE {
            events.pop_front();
        }
        events.push_back(event);
    }
}
