//! Logging: tracing subscriber for the CLI
//!
//! `RUST_LOG` filters (default `warn`, so digest traces stay quiet unless asked for).
//! `BEESCOPE_LOG_JSON=1` switches to JSON lines. Output goes to stderr so stdout
//! stays machine-readable.

use tracing_subscriber::{fmt, EnvFilter};

pub const JSON_ENV: &str = "BEESCOPE_LOG_JSON";

/// Install the global subscriber. `filter` overrides `RUST_LOG` when given.
/// A second call is a no-op.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = if json_requested() { builder.json().try_init() } else { builder.compact().try_init() };
}

fn json_requested() -> bool {
    std::env::var(JSON_ENV).map(|value| value == "1").unwrap_or(false)
}
