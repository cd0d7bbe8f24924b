/// Tools Module
///
/// Holds the tool registry advertised through `tools/list` and the dispatch
/// logic behind `tools/call`. Each tool lives in its own module exporting a
/// `register` function plus its typed argument struct.

pub mod history;
pub mod quote;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::protocol::CallResult;
use crate::fetcher::{FetchError, Fetcher};

use history::HistoryArgs;
use quote::QuoteArgs;

/// MCP tool definition as returned by `tools/list`.
///
/// Field names are serialized in camelCase (`inputSchema`, `outputSchema`)
/// as the MCP protocol expects.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool identifier (e.g., "getStockQuote")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema of the accepted arguments, including defaults
    pub input_schema: Value,
    /// JSON Schema of the text payload returned on success
    pub output_schema: Value,
}

/// Ordered, immutable set of advertised tools.
///
/// Built once by `initialize_tools` and never mutated afterwards, so it can
/// be shared between concurrent calls without locking.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tool. `tools/list` reports tools in registration order.
    ///
    /// # Arguments
    /// * `tool` - Descriptor with name, description, and both schemas
    pub fn register(&mut self, tool: ToolDescriptor) {
        self.tools.push(tool);
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }
}

/// Build the registry with every tool this server offers.
pub fn initialize_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    quote::register(&mut registry);
    history::register(&mut registry);
    registry
}

/// A validated tool invocation with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Quote {
        symbol: String,
    },
    History {
        symbol: String,
        period: String,
        interval: String,
    },
}

impl ToolCall {
    /// Validate a raw `(name, arguments)` pair.
    ///
    /// # Arguments
    /// * `name` - Tool name from the `tools/call` params
    /// * `arguments` - Argument object; `{}` when the caller sent none
    ///
    /// # Returns
    /// The typed call, `UnknownTool` for names not in the registry, or
    /// `InvalidArguments` when required fields are missing or mistyped.
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolError> {
        match name {
            quote::NAME => {
                let QuoteArgs { symbol } = parse_args(arguments)?;
                Ok(Self::Quote { symbol })
            }
            history::NAME => {
                let (symbol, period, interval) = parse_args::<HistoryArgs>(arguments)?.resolve();
                Ok(Self::History {
                    symbol,
                    period,
                    interval,
                })
            }
            _ => Err(ToolError::new(ToolErrorKind::UnknownTool, name)),
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| {
        ToolError::new(
            ToolErrorKind::InvalidArguments,
            format!("Invalid arguments: {}", e),
        )
    })
}

/// Category of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Name not present in the registry
    UnknownTool,
    /// Arguments missing or of the wrong type
    InvalidArguments,
    /// Fetcher could not be started, exited non-zero, or timed out
    FetcherFailed,
    /// Fetcher exited 0 but its stdout was not the expected JSON
    MalformedOutput,
}

/// Structured failure of a single tool call.
///
/// Only turned into text when the call result envelope is built; the
/// `Display` output is exactly the text the caller sees.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    /// Free-text description, usually the fetcher's diagnostic output
    pub detail: String,
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ToolErrorKind::UnknownTool => write!(f, "Unknown tool"),
            _ => write!(f, "Error: {}", self.detail),
        }
    }
}

impl std::error::Error for ToolError {}

impl ToolError {
    pub fn new(kind: ToolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Text shown to the caller.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl From<FetchError> for ToolError {
    fn from(err: FetchError) -> Self {
        let kind = if err.is_malformed_output() {
            ToolErrorKind::MalformedOutput
        } else {
            ToolErrorKind::FetcherFailed
        };
        Self::new(kind, err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ToolErrorKind::MalformedOutput, err.to_string())
    }
}

/// Execute a tool call and wrap the outcome in a call result envelope.
///
/// Never fails: every error becomes an `isError: true` result.
///
/// # Arguments
/// * `fetcher` - Data source the call is delegated to
/// * `name` - Tool name from the `tools/call` params
/// * `arguments` - Raw argument object
///
/// # Returns
/// On success a single text block holding the fetcher's JSON exactly as it
/// was produced.
pub async fn call_tool(fetcher: &dyn Fetcher, name: &str, arguments: Value) -> CallResult {
    match execute(fetcher, name, arguments).await {
        Ok(text) => CallResult::text(text),
        Err(err) => {
            warn!(tool = name, kind = ?err.kind, detail = %err.detail, "tool call failed");
            CallResult::error(err.render())
        }
    }
}

async fn execute(fetcher: &dyn Fetcher, name: &str, arguments: Value) -> Result<String, ToolError> {
    let call = ToolCall::parse(name, arguments)?;
    debug!(?call, "dispatching tool call");

    let text = match call {
        ToolCall::Quote { symbol } => {
            let quote = fetcher.fetch_quote(&symbol).await?;
            serde_json::to_string(&quote)?
        }
        ToolCall::History {
            symbol,
            period,
            interval,
        } => {
            let bars = fetcher.fetch_history(&symbol, &period, &interval).await?;
            serde_json::to_string(&bars)?
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::stub::StubFetcher;
    use serde_json::json;

    const QUOTE_JSON: &str =
        r#"{"symbol":"RELIANCE.NS","price":2500.5,"name":"Reliance Industries"}"#;
    const HISTORY_JSON: &str = r#"[{"date":"2024-01-02T00:00:00+05:30","open":3700.0,"high":3750.5,"low":3690.0,"close":3740.25,"volume":123456}]"#;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_registry_lists_two_tools_in_order() {
        let registry = initialize_tools();
        let names: Vec<&str> = registry
            .list_tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["getStockQuote", "getHistoricalData"]);

        for tool in registry.list_tools() {
            assert_eq!(tool.input_schema["required"], json!(["symbol"]));
            assert!(tool.output_schema.get("type").is_some());
        }
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let registry = initialize_tools();
        let value = serde_json::to_value(&registry.list_tools()[1]).unwrap();

        assert!(value.get("inputSchema").is_some());
        assert!(value.get("outputSchema").is_some());
        assert_eq!(
            value["inputSchema"]["properties"]["period"]["default"],
            json!("1mo")
        );
        assert_eq!(
            value["inputSchema"]["properties"]["interval"]["default"],
            json!("1d")
        );
    }

    #[test]
    fn test_parse_missing_symbol() {
        let err = ToolCall::parse("getStockQuote", json!({})).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
        assert!(err.render().starts_with("Error: Invalid arguments"));
    }

    #[test]
    fn test_parse_history_null_period_defaults() {
        let call = ToolCall::parse(
            "getHistoricalData",
            json!({"symbol": "TCS.NS", "period": null}),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::History {
                symbol: "TCS.NS".to_string(),
                period: "1mo".to_string(),
                interval: "1d".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_quote_success_relays_json() {
        let fetcher = StubFetcher::succeeding(QUOTE_JSON);
        let result = call_tool(&fetcher, "getStockQuote", json!({"symbol": "RELIANCE.NS"})).await;

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.content[0].text, QUOTE_JSON);
        assert_eq!(fetcher.calls(), vec![strings(&["quote", "RELIANCE.NS"])]);
    }

    #[tokio::test]
    async fn test_quote_failure_carries_stderr() {
        let fetcher = StubFetcher::failing(1, "invalid symbol");
        let result = call_tool(&fetcher, "getStockQuote", json!({"symbol": "BAD"})).await;

        assert!(result.is_error);
        assert!(result.content[0].text.starts_with("Error: "));
        assert!(result.content[0].text.contains("invalid symbol"));
    }

    #[tokio::test]
    async fn test_history_defaults_period_and_interval() {
        let fetcher = StubFetcher::succeeding(HISTORY_JSON);
        let result = call_tool(&fetcher, "getHistoricalData", json!({"symbol": "TCS.NS"})).await;

        assert!(!result.is_error);
        assert_eq!(result.content[0].text, HISTORY_JSON);
        assert_eq!(
            fetcher.calls(),
            vec![strings(&["history", "TCS.NS", "1mo", "1d"])]
        );
    }

    #[tokio::test]
    async fn test_history_passes_explicit_values() {
        let fetcher = StubFetcher::succeeding("[]");
        let result = call_tool(
            &fetcher,
            "getHistoricalData",
            json!({"symbol": "TCS.NS", "period": "5d", "interval": "1d"}),
        )
        .await;

        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "[]");
        assert_eq!(
            fetcher.calls(),
            vec![strings(&["history", "TCS.NS", "5d", "1d"])]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_skips_fetcher() {
        let fetcher = StubFetcher::succeeding(QUOTE_JSON);
        let result = call_tool(&fetcher, "doesNotExist", json!({})).await;

        assert!(result.is_error);
        assert_eq!(result.content[0].text, "Unknown tool");
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_output_is_error_result() {
        let fetcher = StubFetcher::succeeding(r#"{"symbol":"RELIANCE.NS","pri"#);
        let result = call_tool(&fetcher, "getStockQuote", json!({"symbol": "RELIANCE.NS"})).await;

        assert!(result.is_error);
        assert!(result.content[0].text.starts_with("Error: JSON parse error"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_skip_fetcher() {
        let fetcher = StubFetcher::succeeding("[]");
        let result = call_tool(&fetcher, "getHistoricalData", json!({"symbol": 42})).await;

        assert!(result.is_error);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quote_relays_fetcher_json_unchanged() {
        let raw = r#"{"name":"Reliance Industries","symbol":"RELIANCE.NS","price":2500}"#;
        let fetcher = StubFetcher::succeeding(raw);
        let result = call_tool(&fetcher, "getStockQuote", json!({"symbol": "RELIANCE.NS"})).await;

        assert!(!result.is_error);
        assert_eq!(result.content[0].text, raw);
    }

    #[tokio::test]
    async fn test_history_accepts_float_volume() {
        let raw = r#"[{"date":"2024-01-02","open":3700,"high":3750.5,"low":3690,"close":3740.25,"volume":1200000.0}]"#;
        let fetcher = StubFetcher::succeeding(raw);
        let result = call_tool(&fetcher, "getHistoricalData", json!({"symbol": "TCS.NS"})).await;

        assert!(!result.is_error);
        assert_eq!(result.content[0].text, raw);
    }

    #[test]
    fn test_error_display_matches_rendered_text() {
        let unknown = ToolError::new(ToolErrorKind::UnknownTool, "doesNotExist");
        assert_eq!(unknown.to_string(), "Unknown tool");

        let failed = ToolError::new(ToolErrorKind::FetcherFailed, "invalid symbol");
        assert_eq!(failed.render(), "Error: invalid symbol");
    }

    #[test]
    fn test_fetch_error_kinds() {
        let exited = FetchError::Exited {
            status: "exited with status 1".to_string(),
            detail: "boom".to_string(),
        };
        assert_eq!(ToolError::from(exited).kind, ToolErrorKind::FetcherFailed);

        let malformed = serde_json::from_str::<Value>("{").unwrap_err();
        assert_eq!(
            ToolError::from(FetchError::from(malformed)).kind,
            ToolErrorKind::MalformedOutput
        );
    }
}
