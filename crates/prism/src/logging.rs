//! Subscriber setup for the `tracing` events emitted by prism-core.
//!
//! Logs go to stderr; stdout is reserved for data output. `RUST_LOG`
//! overrides the level chosen here.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize from the `[logging]` section; CLI flags win.
pub fn init_from_config(config: &prism_core::Config, verbose: bool, json_logs: bool) {
    let level = effective_level(&config.logging.level, verbose);
    let json_format = json_logs || config.logging.format.eq_ignore_ascii_case("json");
    init(level, json_format);
}

fn effective_level(configured: &str, verbose: bool) -> &str {
    match configured.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        _ if verbose => "debug",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}
