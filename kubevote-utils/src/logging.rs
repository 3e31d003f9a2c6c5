//! Tracing setup shared by both binaries.

use tracing_subscriber::EnvFilter;

/// Initialises a `tracing-subscriber` fmt layer reading its level from
/// `RUST_LOG`, or `debug`/`info` depending on `debug`.
///
/// Call once, near the top of `main`.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
