//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Derive the default filter from configuration
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - RUST_LOG overrides the configured level when set
//! - Initialized once by the binary; the library never installs a
//!   subscriber so embedders keep control of theirs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
///
/// Call once at startup, before anything logs. A second call panics,
/// which is the desired failure mode for a double-initialized binary.
pub fn init_logging(config: &ObservabilityConfig) {
    let default_filter = format!(
        "api_chassis={level},tower_http={level}",
        level = config.log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
