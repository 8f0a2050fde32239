//! Diagnostics for the `pbx` tool.
//!
//! Events go to stderr so that transcoded output on stdout stays clean.
//! `RUST_LOG` takes precedence over the level chosen with `-v`.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level for the number of `-v` flags given.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber. A second call is a no-op.
pub fn init(verbosity: u8) {
    let filter = build_env_filter(level_for_verbosity(verbosity));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    // Other crates stay at warn.
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,libpbx={level},pbx={level}")))
}
