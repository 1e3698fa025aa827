use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

/// How much of the crate's own logging to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only errors
    Quiet,
    /// Number of times `-v` was given
    Verbose(usize),
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

impl Verbosity {
    /// The filter directive used when `RUST_LOG` is not set.
    pub fn filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "off,dex_search=error,dex_catalog=error",
            Verbosity::Verbose(0) => "off,dex_search=warn,dex_catalog=warn",
            Verbosity::Verbose(1) => "off,dex_search=info,dex_catalog=info",
            Verbosity::Verbose(2) => "off,dex_search=debug,dex_catalog=debug",
            Verbosity::Verbose(3) => "off,dex_search=trace,dex_catalog=trace",
            // Include the HTTP stack
            Verbosity::Verbose(4) => "debug,dex_search=trace,dex_catalog=trace",
            Verbosity::Verbose(_) => "trace",
        }
    }
}

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber, or adjust its filter if it is installed
/// already. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logger(verbosity: Verbosity) -> Result<()> {
    let handle = match LOGGER_HANDLE.get() {
        Some(handle) => handle,
        None => {
            let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(
                EnvFilter::try_new("trace").context("could not build initial log filter")?,
            );
            let log_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry()
                .with(log_layer)
                .try_init()
                .context("could not install logger")?;
            LOGGER_HANDLE.get_or_init(|| reload_handle)
        },
    };

    update_filters(handle, verbosity.filter())
}

/// Replace the active filter with `RUST_LOG`, or `log_filter` if `RUST_LOG`
/// is unset or invalid.
fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_filter)
            .with_context(|| format!("invalid log filter '{log_filter}'"))?,
    };
    filter_handle
        .reload(filter)
        .context("could not update log filter")
}
