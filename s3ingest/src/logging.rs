//! Diagnostic logging, written to stderr.

use std::io;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::common::*;

/// The default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn";

/// What log format we should use.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum LogFormat {
    /// Single-line log entries.
    Compact,
    /// Multi-line, human-friendly log entries.
    Pretty,
    /// JSON records.
    Json,
}

impl LogFormat {
    /// Install a global `tracing` subscriber using this format. This also
    /// forwards records from the `log` crate, which `tokio-postgres` uses.
    pub(crate) fn install(self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr);
        let installed = match self {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|err| format_err!("could not set up logging: {}", err))
    }
}
