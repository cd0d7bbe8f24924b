/// getStockQuote Tool
///
/// Looks up the current price of a single symbol.

use serde::Deserialize;
use serde_json::json;

use super::{ToolDescriptor, ToolRegistry};

pub const NAME: &str = "getStockQuote";

/// Arguments accepted by `getStockQuote`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QuoteArgs {
    pub symbol: String,
}

/// Register the quote tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    registry.register(ToolDescriptor {
        name: NAME.to_string(),
        description: "Get the current price of an Indian stock".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The stock symbol (e.g., RELIANCE.NS for Reliance Industries)"
                }
            },
            "required": ["symbol"]
        }),
        output_schema: json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string" },
                "price": { "type": "number" },
                "name": { "type": "string" }
            },
            "required": ["symbol", "price", "name"]
        }),
    });
}
