//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Install a JSON logger writing to stderr as the global subscriber.
///
/// The level comes from the `RUST_LOG` environment variable and defaults to
/// `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
