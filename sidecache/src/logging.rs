//! Tracing subscriber setup.
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG` when set,
//! otherwise by the configured level. When a log directory is configured,
//! output goes to a daily rolling file through a non-blocking writer and the
//! returned [`WorkerGuard`] must be kept alive until shutdown so buffered
//! lines are flushed.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub use tracing_appender::non_blocking::WorkerGuard;

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "sidecache.log";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("Failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Install the global tracing subscriber.
///
/// Returns the file writer guard when logging to a directory.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

    match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
                path: dir.clone(),
                source,
            })?;

            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(LocalTime::rfc_3339())
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;

            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_rejects_file_as_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let config = LoggingConfig {
            directory: Some(file.join("logs")),
            ..Default::default()
        };

        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, LoggingError::Directory { .. }));
    }

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::Install("already set".to_string());
        assert!(err.to_string().contains("already set"));
    }
}
