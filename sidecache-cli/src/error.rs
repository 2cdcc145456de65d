//! CLI error type.

use sidecache::cache::{CacheError, InputError};
use sidecache::config::ConfigError;
use sidecache::logging::LoggingError;
use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Side input error: {0}")]
    Input(#[from] InputError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
