//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with an env-filter.
///
/// Honors `RUST_LOG`; defaults to debug-level output for this crate.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reply_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
