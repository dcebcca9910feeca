//! Structured logging setup shared by the driver and the CLI.
//!
//! Every binary that links `faxc-util` calls [`init_tracing`] exactly once at
//! startup instead of configuring `tracing-subscriber` itself, so the
//! `RUST_LOG`/`-v` behavior stays identical between `faxc-drv`'s own test
//! harness and `faxt`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global `tracing` subscriber.
///
/// `verbose` maps to the `debug` filter, otherwise `info`; either is
/// overridden by `RUST_LOG` if set. Returns an error rather than panicking
/// if a subscriber was already installed, since tests in the same process
/// may call this more than once.
pub fn init_tracing(verbose: bool, no_color: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let layer = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))
}
