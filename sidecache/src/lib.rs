//! sidecache - Side input caching for pipeline worker harnesses
//!
//! A runner hands a worker opaque cache tokens with every bundle. While a
//! token is held by at least one active bundle, the side input it names may
//! be served from memory instead of being fetched again over the state API.
//! This crate provides that cache together with the configuration and
//! logging setup used by the `sidecache` binary.

pub mod cache;
pub mod config;
pub mod logging;

/// Crate version, for logging and CLI output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
