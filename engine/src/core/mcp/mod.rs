//! Embedded MCP server.
//!
//! The engine plays the server role of the Model Context Protocol: the remote
//! model lists and calls host-registered tools through JSON-RPC 2.0 objects
//! tunnelled inside `{"type":"mcp","payload":…}` control frames.
//!
//! `initialize` and `tools/list` are answered directly from the
//! [`ToolRegistry`]; `tools/call` is surfaced to the host application, which
//! answers asynchronously through the engine.

mod registry;
mod rpc;

pub use registry::{ParamSchema, ToolDescriptor, ToolRegistry};
pub use rpc::{call_error, call_response, handle_request, McpValue, RpcOutcome};

/// MCP protocol revision implemented by this server.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported by `initialize`.
pub const MCP_SERVER_NAME: &str = "ai-vox";
