//! Logging setup for the command line tool. Logs always go to stderr so
//! stdout stays clean for JSON and Typst output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over `--debug`, which wins
/// over the configured level.
pub fn init_logging(config: &LoggingConfig, debug_override: bool) {
    let level = if debug_override {
        "debug".to_string()
    } else {
        config.level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber may already be installed (tests, embedding binaries).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
