//! Tracing setup for the CLI.
//!
//! Logs go to stderr so stdout stays clean for JSON and JSONL data. The
//! level comes from the config file, `--verbose` bumps it to debug, and
//! `RUST_LOG` overrides both.

use linnea_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(config: &Config, verbose: bool, json_logs: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs || config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
