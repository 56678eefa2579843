//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Events go to stderr so generated documents on stdout stay clean
//! - Log level configurable via `RUST_LOG`, falling back to the caller's default

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "auth_gateway=info";

/// Install the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
