//! In-memory fetcher for tests. Replays canned stdout or a canned failure and
//! records every invocation as the argument list a subprocess would have seen.
//! Per-symbol delays stand in for slow upstream lookups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Bar, FetchError, Fetcher, HISTORY_OPERATION, QUOTE_OPERATION, Quote, parse_output};

#[derive(Debug, Clone)]
enum Outcome {
    Stdout(String),
    Exit { code: i32, stderr: String },
}

#[derive(Debug)]
pub struct StubFetcher {
    outcome: Outcome,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubFetcher {
    /// Behave like a fetcher that exits 0 after printing `stdout`.
    pub fn succeeding(stdout: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Stdout(stdout.into()))
    }

    /// Behave like a fetcher that exits `code` after printing `stderr`.
    pub fn failing(code: i32, stderr: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Exit {
            code,
            stderr: stderr.into(),
        })
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call for `symbol` for `delay` before answering.
    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    async fn pause(&self, symbol: &str) {
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn invoke(&self, args: &[&str]) -> Result<&str, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(|a| a.to_string()).collect());

        match &self.outcome {
            Outcome::Stdout(stdout) => Ok(stdout),
            Outcome::Exit { code, stderr } => Err(FetchError::Exited {
                status: format!("exited with status {}", code),
                detail: stderr.trim().to_string(),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let stdout = self.invoke(&[QUOTE_OPERATION, symbol]);
        self.pause(symbol).await;
        parse_output(stdout?.as_bytes())
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, FetchError> {
        let stdout = self.invoke(&[HISTORY_OPERATION, symbol, period, interval]);
        self.pause(symbol).await;
        parse_output(stdout?.as_bytes())
    }
}
