//! Tracing subscriber setup

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

const DEFAULT_FILTER: &str = "info";

/// Build the level filter
///
/// An explicit `level` wins over `RUST_LOG`; with neither, `info`.
pub fn filter(level: Option<&str>) -> Result<EnvFilter> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER)),
    };
    filter.map_err(|e| CliError::config(format!("invalid log filter: {e}"), None))
}

/// Install the global subscriber, writing to stderr
pub fn init(level: Option<&str>, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(filter(level)?);

    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| CliError::Other {
        message: format!("failed to install logger: {e}"),
    })
}
