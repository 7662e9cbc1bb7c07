//! Error handling for the event aggregator
//!
//! Lookup misses (unknown event type, listener not registered) are never
//! errors; they resolve to `false` or a no-op. The only failure a publisher
//! can observe is a listener that panics during dispatch.
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Which listener registry a dispatch pass was walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchPass {
    /// Listeners invoked without arguments.
    NoPayload,
    /// Listeners invoked with a reference to the published value.
    Payload,
}

impl fmt::Display for DispatchPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPass::NoPayload => write!(f, "no-payload"),
            DispatchPass::Payload => write!(f, "payload"),
        }
    }
}

/// Main error type for the event aggregator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventAggregatorError {
    /// A listener panicked while an event was being published.
    ///
    /// Listeners after `index` in the same pass, and the payload pass if the
    /// failure happened in the no-payload pass, were not invoked.
    #[error("{pass} listener #{index} for {event_type} panicked: {message}")]
    ListenerPanicked {
        /// Name of the published event type.
        event_type: &'static str,
        /// The pass that was running.
        pass: DispatchPass,
        /// Zero-based position of the listener within the pass.
        index: usize,
        /// The panic message, if it was a string.
        message: String,
    },
}

impl EventAggregatorError {
    /// Check if this error came from a panicking listener
    pub fn is_listener_panic(&self) -> bool {
        matches!(self, EventAggregatorError::ListenerPanicked { .. })
    }

    pub(crate) fn listener_panicked(
        event_type: &'static str,
        pass: DispatchPass,
        index: usize,
        payload: Box<dyn Any + Send>,
    ) -> Self {
        EventAggregatorError::ListenerPanicked {
            event_type,
            pass,
            index,
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Extract a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result type using EventAggregatorError
pub type Result<T> = std::result::Result<T, EventAggregatorError>;
