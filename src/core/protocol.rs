/// JSON-RPC 2.0 and MCP Wire Types
///
/// Request/response framing shared by the stdio and HTTP transports, and the
/// call result envelope every `tools/call` produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request. A missing `id` marks a notification.
#[derive(Deserialize, Debug, Clone)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    #[allow(dead_code)]
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default)]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters
    #[serde(default)]
    pub params: Option<Value>,
}

impl MCPRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response carrying either `result` or `error`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    pub jsonrpc: String,
    /// Request ID from the original request; null for parse errors
    pub id: Option<Value>,
    /// Response result, present when the request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information, present when the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Parameters of a `tools/call` request.
#[derive(Deserialize, Debug, Clone)]
pub struct CallToolParams {
    /// Tool to invoke
    pub name: String,
    /// Tool arguments; treated as `{}` when absent
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// One content block of a call result. Only text content is produced.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Content {
    /// Content type, always "text"
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Call result envelope: `{content, isError}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    /// Ordered content blocks; exactly one text block per call
    pub content: Vec<Content>,
    /// True when the call failed and `content` holds the error text
    pub is_error: bool,
}

impl CallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self::single(text.into(), false)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::single(text.into(), true)
    }

    fn single(text: String, is_error: bool) -> Self {
        Self {
            content: vec![Content {
                kind: "text".to_string(),
                text,
            }],
            is_error,
        }
    }
}
