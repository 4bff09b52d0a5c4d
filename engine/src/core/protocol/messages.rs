//! Control-frame message types.
//!
//! All frames are JSON objects discriminated by a top-level `type` field.
//! Client frames after `hello` echo the server-issued `session_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AUDIO_CHANNELS, AUDIO_FORMAT, AUDIO_FRAME_DURATION_MS, AUDIO_SAMPLE_RATE, PROTOCOL_VERSION,
};

/// Audio parameters block of the outbound `hello` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioParams {
    pub format: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub frame_duration: u32,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            format: AUDIO_FORMAT.to_owned(),
            sample_rate: AUDIO_SAMPLE_RATE,
            channels: AUDIO_CHANNELS,
            frame_duration: AUDIO_FRAME_DURATION_MS,
        }
    }
}

/// Feature flags advertised to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub mcp: bool,
}

/// Frames the engine sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello {
        version: u32,
        transport: String,
        features: Features,
        audio_params: AudioParams,
    },
    Listen {
        session_id: String,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Abort {
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Mcp {
        session_id: String,
        payload: Value,
    },
}

impl ClientMessage {
    /// The protocol handshake sent as soon as the WebSocket opens.
    pub fn hello() -> Self {
        Self::Hello {
            version: PROTOCOL_VERSION,
            transport: "websocket".to_owned(),
            features: Features { mcp: true },
            audio_params: AudioParams::default(),
        }
    }

    /// Start of a listening turn, auto-stop mode.
    pub fn listen_start(session_id: &str) -> Self {
        Self::Listen {
            session_id: session_id.to_owned(),
            state: "start".to_owned(),
            mode: Some("auto".to_owned()),
            text: None,
        }
    }

    /// Synthetic wake-word notification after a wake-initiated connect.
    pub fn listen_detect(session_id: &str, wake_phrase: &str) -> Self {
        Self::Listen {
            session_id: session_id.to_owned(),
            state: "detect".to_owned(),
            mode: None,
            text: Some(wake_phrase.to_owned()),
        }
    }

    /// Interrupt the current speaking turn.
    pub fn abort(session_id: &str, reason: Option<&str>) -> Self {
        Self::Abort {
            session_id: session_id.to_owned(),
            reason: reason.map(str::to_owned),
        }
    }

    /// An MCP envelope carrying a JSON-RPC payload.
    pub fn mcp(session_id: &str, payload: Value) -> Self {
        Self::Mcp {
            session_id: session_id.to_owned(),
            payload,
        }
    }
}

/// Frames the server sends to the engine.
///
/// `tts.state` stays a plain string: the set of states is open-ended on the
/// server side and unknown values are ignored, not rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Hello {
        #[serde(default)]
        session_id: Option<String>,
    },
    Goodbye {
        #[serde(default)]
        session_id: Option<String>,
    },
    Tts {
        state: String,
        #[serde(default)]
        text: Option<String>,
    },
    Stt {
        #[serde(default)]
        text: Option<String>,
    },
    Llm {
        #[serde(default)]
        emotion: Option<String>,
    },
    Mcp {
        payload: Value,
    },
    #[serde(other)]
    Unknown,
}
