//! Shared startup for commands that run the cache.
//!
//! Loads the configuration file and installs the tracing subscriber, keeping
//! the file writer guard alive for as long as the runner exists.

use std::path::Path;

use sidecache::config::ConfigFile;
use sidecache::logging::{init_logging, WorkerGuard};
use tracing::info;

use crate::error::CliError;

/// Loaded configuration plus an installed logger.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load config (from `config_path` or the default location) and start logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let log_guard = init_logging(&config.logging)?;
        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log a startup line for `command`.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = sidecache::VERSION,
            capacity = self.config.cache.capacity,
            "sidecache starting"
        );
    }
}

/// Load the config file at `path`, or the default one when `None`.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    config.cache.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_from_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[cache]\ncapacity = 9\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.cache.capacity, 9);
    }

    #[test]
    fn test_load_config_invalid_capacity() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[cache]\ncapacity = 0\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::Config(_))
        ));
    }
}
