pub mod cli;
pub mod commands;
pub mod config;
pub mod tts;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr; stdout is the UI.
///
/// `RUST_LOG` wins over `verbosity` when set.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("viet_tts={},warn", level)));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
