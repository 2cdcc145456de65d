//! INI configuration file.
//!
//! Settings live in `~/.sidecache/config.ini`:
//!
//! ```ini
//! [cache]
//! capacity = 100
//!
//! [logging]
//! level = info
//! directory = /var/log/sidecache
//! ```
//!
//! A missing file yields the defaults. A present file with a bad value is an
//! error rather than a silent fallback.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::Level;

/// Default number of side inputs the cache holds.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default log level when neither the config file nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: Level = Level::INFO;

const CACHE_SECTION: &str = "cache";
const LOGGING_SECTION: &str = "logging";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid INI.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A setting has a value that cannot be used.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// No home directory to place the config file in.
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Side input cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached side inputs. Must be positive.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the settings without building a cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.capacity".to_string(),
                value: "0".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Maximum level to emit. `RUST_LOG` takes precedence when set.
    pub level: Level,
    /// Directory for daily rolling log files. `None` logs to stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            directory: None,
        }
    }
}

/// Complete contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Default config file location (`~/.sidecache/config.ini`).
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".sidecache").join("config.ini"))
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoHomeDir)?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file. Keys that are absent keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(err) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        })?;

        let mut config = Self::default();

        if let Some(section) = ini.section(Some(CACHE_SECTION)) {
            if let Some(value) = section.get("capacity") {
                config.cache.capacity = parse_capacity(value)?;
            }
        }

        if let Some(section) = ini.section(Some(LOGGING_SECTION)) {
            if let Some(value) = section.get("level") {
                config.logging.level = parse_level(value)?;
            }
            if let Some(value) = section.get("directory") {
                let value = value.trim();
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }

        Ok(config)
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some(CACHE_SECTION))
            .set("capacity", self.cache.capacity.to_string());
        ini.with_section(Some(LOGGING_SECTION))
            .set("level", self.logging.level.as_str().to_lowercase())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            );

        ini.write_to_file(path).map_err(io_err)
    }
}

fn parse_capacity(value: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: "cache.capacity".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let capacity: i64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("not an integer"))?;
    if capacity <= 0 {
        return Err(invalid("must be a positive integer"));
    }
    usize::try_from(capacity).map_err(|_| invalid("too large"))
}

fn parse_level(value: &str) -> Result<Level, ConfigError> {
    value
        .trim()
        .parse::<Level>()
        .map_err(|_| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            value: value.to_string(),
            reason: "expected one of trace, debug, info, warn, error".to_string(),
        })
}
