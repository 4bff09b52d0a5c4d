//! JSON-RPC 2.0 request handling and response framing.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ToolRegistry, MCP_PROTOCOL_VERSION, MCP_SERVER_NAME};

/// A typed tool-call argument or response value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl McpValue {
    /// Textual rendering used in `tools/call` result content.
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => if *b { "true" } else { "false" }.to_owned(),
        }
    }
}

impl From<&str> for McpValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for McpValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for McpValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for McpValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// What a handled request asks the engine to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// Send this JSON-RPC object back as the MCP payload.
    Reply(Value),
    /// Surface the call to the host; no automatic reply.
    ToolCall {
        id: i64,
        name: String,
        params: BTreeMap<String, McpValue>,
    },
    /// Nothing to do (malformed, unsupported or non-2.0 payload).
    Ignored,
}

/// Handle one inbound JSON-RPC payload against the registry.
///
/// Payloads whose `jsonrpc` field is not exactly `"2.0"` are rejected.
pub fn handle_request(registry: &ToolRegistry, payload: &Value) -> RpcOutcome {
    let Some(obj) = payload.as_object() else {
        warn!("mcp payload is not an object");
        return RpcOutcome::Ignored;
    };

    match obj.get("jsonrpc").and_then(Value::as_str) {
        Some("2.0") => {}
        other => {
            warn!(jsonrpc = ?other, "rejecting mcp payload with unsupported jsonrpc version");
            return RpcOutcome::Ignored;
        }
    }

    let id = obj.get("id").and_then(Value::as_i64);
    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        warn!("mcp payload has no method");
        return RpcOutcome::Ignored;
    };
    debug!(method, id, "mcp request");

    match method {
        "initialize" => {
            let Some(id) = id else {
                warn!("initialize request without id");
                return RpcOutcome::Ignored;
            };
            RpcOutcome::Reply(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": MCP_SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                },
            }))
        }
        "tools/list" => {
            let Some(id) = id else {
                warn!("tools/list request without id");
                return RpcOutcome::Ignored;
            };
            RpcOutcome::Reply(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": registry.to_json(),
            }))
        }
        "tools/call" => {
            let Some(id) = id else {
                warn!("tools/call request without id");
                return RpcOutcome::Ignored;
            };
            let params = obj.get("params");
            let Some(name) = params
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
            else {
                warn!("tools/call request without tool name");
                return RpcOutcome::Ignored;
            };

            let mut arguments = BTreeMap::new();
            if let Some(raw) = params
                .and_then(|p| p.get("arguments"))
                .and_then(Value::as_object)
            {
                for (key, value) in raw {
                    match convert_argument(value) {
                        Some(converted) => {
                            arguments.insert(key.clone(), converted);
                        }
                        None => {
                            warn!(tool = name, argument = %key, "dropping argument of unsupported kind");
                        }
                    }
                }
            }

            RpcOutcome::ToolCall {
                id,
                name: name.to_owned(),
                params: arguments,
            }
        }
        other => {
            debug!(method = other, "ignoring unsupported mcp method");
            RpcOutcome::Ignored
        }
    }
}

/// Successful `tools/call` reply for `id`.
///
/// Non-string values are rendered as text: integers in decimal, booleans as
/// `"true"`/`"false"`.
pub fn call_response(id: i64, value: &McpValue) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "content": [{ "type": "text", "text": value.to_text() }],
            "isError": false,
        },
    })
}

/// Failed `tools/call` reply for `id`.
pub fn call_error(id: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "message": message },
    })
}

fn convert_argument(value: &Value) -> Option<McpValue> {
    match value {
        Value::String(s) => Some(McpValue::String(s.clone())),
        Value::Bool(b) => Some(McpValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                Some(McpValue::Integer(int))
            } else {
                // Truncate floating-point arguments toward zero.
                n.as_f64().map(|f| McpValue::Integer(f.trunc() as i64))
            }
        }
        _ => None,
    }
}
