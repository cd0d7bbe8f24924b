/// Server Configuration
///
/// All settings come from environment variables read once at startup.
/// Lookups go through a closure so tests can supply their own values.

use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::ProcessFetcher;

const DEFAULT_PORT: u16 = 3000;
const MAX_DEFAULT_WORKERS: usize = 16;

/// Which inbound transports to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::InvalidTransport(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid transport mode '{0}'; must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),

    #[error("invalid FETCHER_TIMEOUT_SECS '{0}'; expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// How to launch the external fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    pub program: String,
    pub script: Option<String>,
    pub timeout: Option<Duration>,
}

impl FetcherConfig {
    pub fn build(&self) -> ProcessFetcher {
        ProcessFetcher::new(self.program.clone(), self.script.iter().cloned().collect())
            .with_timeout(self.timeout)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub fetcher: FetcherConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport = var("MCP_TRANSPORT_MODE", "stdio").parse()?;

        // Unparseable ports fall back to the default rather than aborting.
        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(|| num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS));

        let script = var("FETCHER_SCRIPT", "scripts/fetch.py");
        let timeout = match lookup("FETCHER_TIMEOUT_SECS") {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            name: var("SERVER_NAME", env!("CARGO_PKG_NAME")),
            version: var("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: var("HOST", "0.0.0.0"),
            port,
            workers,
            fetcher: FetcherConfig {
                program: var("FETCHER_PROGRAM", "python3"),
                script: (!script.is_empty()).then_some(script),
                timeout,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string()))
}
