//! Tracing subscriber setup for the binary.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber, writing to stderr so stdout stays free for
/// command output.
///
/// Filtering follows `RUST_LOG`. A second initialisation, e.g. from tests, is
/// reported as a warning rather than treated as fatal.
pub fn init_tracing(json: bool) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
