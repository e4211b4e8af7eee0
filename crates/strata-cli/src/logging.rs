//! Subscriber setup for the `strata` binary.
//!
//! Filtering comes from `STRATA_LOG` (same syntax as `RUST_LOG`), falling
//! back to `warn`. Output goes to stderr so stdout stays valid JSON.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "STRATA_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(json: bool) {
    let registry = tracing_subscriber::registry().with(filter());
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!(target: "strata.cli", "subscriber already installed");
    }
}
