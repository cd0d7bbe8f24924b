/// Market Data Fetcher
///
/// The server never talks to a market-data source itself. Every tool call is
/// delegated to a `Fetcher`, which in production shells out to an external
/// program (see `process.rs`). The program receives positional arguments and
/// answers with a single JSON value on stdout.
///
/// Parsed results keep the exact JSON the fetcher produced. The typed fields
/// only validate the required shape; serializing a `Quote` or `Bar` writes
/// the original value back out, with key order and number formatting intact.

pub mod process;
#[cfg(test)]
pub mod stub;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use process::ProcessFetcher;

/// Operation tag passed as the first argument for quote lookups.
pub const QUOTE_OPERATION: &str = "quote";
/// Operation tag passed as the first argument for price history lookups.
pub const HISTORY_OPERATION: &str = "history";

/// Current quote for a single symbol.
///
/// Any fields beyond the three required ones stay in `raw` and are relayed
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Symbol as reported by the fetcher (e.g., "RELIANCE.NS")
    pub symbol: String,
    /// Current or last regular-market price
    pub price: f64,
    /// Short company name; fetchers may report none
    pub name: Option<String>,
    raw: Value,
}

#[derive(Deserialize)]
struct QuoteFields {
    symbol: String,
    price: f64,
    name: Option<String>,
}

impl<'de> Deserialize<'de> for Quote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let fields = QuoteFields::deserialize(&raw).map_err(D::Error::custom)?;
        Ok(Self {
            symbol: fields.symbol,
            price: fields.price,
            name: fields.name,
            raw,
        })
    }
}

impl Serialize for Quote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// One OHLCV bar of a historical price series.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// ISO-8601 timestamp of the bar
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded volume. Declared as a JSON number, so floats are accepted.
    pub volume: f64,
    raw: Value,
}

#[derive(Deserialize)]
struct BarFields {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl<'de> Deserialize<'de> for Bar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let fields = BarFields::deserialize(&raw).map_err(D::Error::custom)?;
        Ok(Self {
            date: fields.date,
            open: fields.open,
            high: fields.high,
            low: fields.low,
            close: fields.close,
            volume: fields.volume,
            raw,
        })
    }
}

impl Serialize for Bar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Failure while obtaining data from the fetcher.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to start fetcher `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetcher {status}: {detail}")]
    Exited { status: String, detail: String },

    #[error("fetcher did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("JSON parse error: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl FetchError {
    /// True when the fetcher ran to completion but its output was unusable.
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Source of market data.
///
/// Implementations must be shareable across concurrently running calls.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Look up the current quote for `symbol`.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Fetch the price series for `symbol`.
    ///
    /// # Arguments
    /// * `period` - Time span to cover (e.g., "1mo", "5d", "ytd")
    /// * `interval` - Bar width (e.g., "1d", "1h")
    async fn fetch_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, FetchError>;
}

/// Decode the stdout of a successful fetcher run.
pub(crate) fn parse_output<T: DeserializeOwned>(stdout: &[u8]) -> Result<T, FetchError> {
    Ok(serde_json::from_slice(stdout)?)
}
