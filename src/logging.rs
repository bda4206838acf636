//! Logging setup for the command-line binary.
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. [`init`] installs one that writes to stderr so
//! that stdout carries nothing but fingerprints.

use crate::defaults::LOG_ENV;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Another global subscriber is already installed.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing_subscriber::util::TryInitError),
}

/// Initialize tracing on stderr.
///
/// `AUDIOSIG_LOG` takes precedence over the level derived from the flags.
/// Subsequent calls are no-ops.
pub fn init(verbosity: u8, quiet: bool) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = build_env_filter(default_directive(verbosity, quiet));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 2),
        )
        .try_init()?;

    INITIALIZED.get_or_init(|| ());
    Ok(())
}

/// Level used when `AUDIOSIG_LOG` is not set.
fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}
