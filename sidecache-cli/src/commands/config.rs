//! Configuration CLI commands.
//!
//! Provides `config path` and `config show` for inspecting the settings the
//! other commands will run with.

use std::path::Path;

use clap::Subcommand;
use sidecache::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the resolved configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(config_path),
        ConfigCommands::Show => run_show(config_path),
    }
}

fn run_path(config_path: Option<&Path>) -> Result<(), CliError> {
    match config_path.map(Path::to_path_buf).or_else(config_file_path) {
        Some(path) => {
            let status = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), status);
        }
        None => println!("(no home directory)"),
    }
    Ok(())
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    print!("{}", render(&config));
    Ok(())
}

fn render(config: &ConfigFile) -> String {
    let directory = config
        .logging
        .directory
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "(stderr)".to_string());

    format!(
        "cache.capacity = {}\nlogging.level = {}\nlogging.directory = {}\n",
        config.cache.capacity,
        config.logging.level.as_str().to_lowercase(),
        directory
    )
}
