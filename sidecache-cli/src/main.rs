//! sidecache CLI - drive and inspect the side input cache
//!
//! The cache itself is embedded by worker harnesses; this binary runs a
//! synthetic multi-worker bundle workload against it and reports the counters.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "sidecache", version, about = "Side input cache for pipeline workers")]
struct Cli {
    /// Path to config.ini (default: ~/.sidecache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a synthetic concurrent bundle workload and print cache metrics
    Simulate {
        /// Cache capacity (overrides cache.capacity from config)
        #[arg(long)]
        capacity: Option<usize>,

        /// Number of worker threads processing bundles
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Number of bundles to process
        #[arg(long, default_value_t = 1000)]
        bundles: usize,

        /// Transforms per bundle
        #[arg(long, default_value_t = 4)]
        transforms: usize,

        /// Side inputs per transform
        #[arg(long, default_value_t = 2)]
        side_inputs: usize,

        /// Bundles per side input generation before tokens roll over
        #[arg(long, default_value_t = 50)]
        generation_span: usize,

        /// Elements per materialized side input
        #[arg(long, default_value_t = 1024)]
        elements: usize,

        /// Seed for the per-bundle side input selection
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Simulate {
            capacity,
            workers,
            bundles,
            transforms,
            side_inputs,
            generation_span,
            elements,
            seed,
            json,
        } => {
            let runner = CliRunner::new(config_path)?;
            commands::simulate::run(
                &runner,
                SimulateArgs {
                    capacity,
                    workers,
                    bundles,
                    transforms,
                    side_inputs,
                    generation_span,
                    elements,
                    seed,
                    json,
                },
            )
        }
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["sidecache", "simulate", "--capacity", "8"]).unwrap();
        match cli.command {
            Commands::Simulate {
                capacity, workers, ..
            } => {
                assert_eq!(capacity, Some(8));
                assert_eq!(workers, 4);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_flag() {
        let cli =
            Cli::try_parse_from(["sidecache", "config", "show", "--config", "/tmp/c.ini"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.ini")));
    }
}
