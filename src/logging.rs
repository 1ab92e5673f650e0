//! Tracing subscriber setup shared by the binary and embedding applications.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Failure to install the global tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log level: {0}")]
    InvalidFilter(String),
    /// A global subscriber was already installed.
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Installs a formatted subscriber on stderr filtered by `level`.
///
/// `level` accepts full `EnvFilter` directives, e.g. `shelfmate=debug,warn`.
pub fn init_logging(level: &str) -> Result<(), LoggingError> {
    install(EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter(e.to_string()))?)
}

/// Like [`init_logging`], but an absent `level` falls back to `RUST_LOG` and
/// then to `fallback`.
pub fn init_logging_or_env(level: Option<&str>, fallback: &str) -> Result<(), LoggingError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    init_logging(choose_directive(level, from_env.as_deref(), fallback))
}

fn choose_directive<'a>(explicit: Option<&'a str>, from_env: Option<&'a str>, fallback: &'a str) -> &'a str {
    explicit
        .or(from_env)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(fallback)
}

fn install(filter: EnvFilter) -> Result<(), LoggingError> {
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
