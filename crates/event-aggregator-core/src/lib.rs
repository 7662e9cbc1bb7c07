//! # Event Aggregator Core
//!
//! A process-local publish/subscribe registry keyed by event type.
//! Provides the listener handle types, the [`TypeKey`] used to index the
//! registries, the [`EventAggregator`] itself and its error types.

pub mod aggregator;
pub mod error;
pub mod types;

pub use error::{DispatchPass, EventAggregatorError, Result};

// Re-export the aggregator for convenience
pub use aggregator::{
    event_aggregator, init_event_aggregator, EventAggregator, EventAggregatorConfig,
};

pub use types::{
    listener, payload_listener, same_listener, Listener, ListenerList, PayloadListener,
    PayloadListenerList, TypeKey,
};
