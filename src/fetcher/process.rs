/// Subprocess Fetcher
///
/// Runs the configured program once per call with positional arguments
/// `[operation, symbol]` or `[operation, symbol, period, interval]`, appended
/// after any leading arguments (typically the script path).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Bar, FetchError, Fetcher, HISTORY_OPERATION, QUOTE_OPERATION, Quote, parse_output};

/// Fetcher backed by an external program.
#[derive(Debug, Clone)]
pub struct ProcessFetcher {
    /// Executable to run (e.g., "python3")
    program: String,
    /// Arguments placed before the operation tag (e.g., the script path)
    leading_args: Vec<String>,
    /// Upper bound on a single run; `None` waits indefinitely
    timeout: Option<Duration>,
}

impl ProcessFetcher {
    /// Create a fetcher with no timeout.
    ///
    /// # Arguments
    /// * `program` - Executable looked up on `PATH` or given as a path
    /// * `leading_args` - Arguments passed before `[operation, symbol, ...]`
    pub fn new(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
            timeout: None,
        }
    }

    /// Kill the fetcher and fail the call if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the program to completion and return its stdout on exit status 0.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, FetchError> {
        debug!(program = %self.program, ?args, "spawning fetcher");

        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(args)
            // stdin belongs to the stdio transport
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = command.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| FetchError::TimedOut(limit))?,
            None => output.await,
        }
        .map_err(|source| FetchError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            let status = match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "was terminated by a signal".to_string(),
            };
            return Err(FetchError::Exited { status, detail });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Fetcher for ProcessFetcher {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let stdout = self.run(&[QUOTE_OPERATION, symbol]).await?;
        parse_output(&stdout)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, FetchError> {
        let stdout = self
            .run(&[HISTORY_OPERATION, symbol, period, interval])
            .await?;
        parse_output(&stdout)
    }
}
