/// getHistoricalData Tool
///
/// Fetches an OHLCV price series for a symbol. `period` and `interval` are
/// optional; absent or empty values fall back to one month of daily bars.

use serde::Deserialize;
use serde_json::json;

use super::{ToolDescriptor, ToolRegistry};

pub const NAME: &str = "getHistoricalData";

pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";

/// Raw arguments as sent by the caller.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryArgs {
    pub symbol: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

impl HistoryArgs {
    /// Resolve defaults, returning `(symbol, period, interval)`.
    pub fn resolve(self) -> (String, String, String) {
        (
            self.symbol,
            or_default(self.period, DEFAULT_PERIOD),
            or_default(self.interval, DEFAULT_INTERVAL),
        )
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Register the historical data tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    registry.register(ToolDescriptor {
        name: NAME.to_string(),
        description: "Fetch historical stock prices".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The stock symbol (e.g., RELIANCE.NS for Reliance Industries)"
                },
                "period": {
                    "type": "string",
                    "description": "Time period (e.g., 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)",
                    "default": DEFAULT_PERIOD
                },
                "interval": {
                    "type": "string",
                    "description": "Data interval (e.g., 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo, 3mo)",
                    "default": DEFAULT_INTERVAL
                }
            },
            "required": ["symbol"]
        }),
        output_schema: json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "date": { "type": "string" },
                    "open": { "type": "number" },
                    "high": { "type": "number" },
                    "low": { "type": "number" },
                    "close": { "type": "number" },
                    "volume": { "type": "number" }
                },
                "required": ["date", "open", "high", "low", "close", "volume"]
            }
        }),
    });
}
