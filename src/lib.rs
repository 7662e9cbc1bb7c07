//! # Event Aggregator
//!
//! Type-keyed publish/subscribe for events inside a single process:
//! - Listeners subscribe per event type, with or without receiving the value
//! - Publishing invokes every matching listener synchronously, in order
//! - Safe to share across threads; listeners may re-enter the aggregator
//!
//! ## Architecture
//!
//! The workspace is organized as:
//!
//! 1. **event-aggregator-core** - Listener types, type keys, registries, errors
//! 2. **event-aggregator** - Facade re-exporting the core plus logging setup

// Re-export modules
pub use event_aggregator_core::{aggregator, error, types};

pub use event_aggregator_core::{
    emit, event_aggregator, init_event_aggregator, listener, on_event, payload_listener,
    same_listener, DispatchPass, EventAggregator, EventAggregatorConfig, EventAggregatorError,
    Listener, PayloadListener, Result, TypeKey,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
