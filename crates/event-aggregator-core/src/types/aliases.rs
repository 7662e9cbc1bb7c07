//! Type aliases for listener handles.
//!
//! Listeners are stored as `Arc`-wrapped closures so that the caller can keep
//! a clone of the exact handle it registered and hand it back later to
//! [`unsubscribe`](crate::EventAggregator::unsubscribe) or
//! [`is_subscribed`](crate::EventAggregator::is_subscribed).
//!
//! ## Identity
//!
//! Closures cannot be compared, so two handles are considered the same
//! listener when they point at the same allocation. Cloning a handle keeps
//! its identity; wrapping the same closure body twice produces two distinct
//! listeners.
//!
//! ## Usage
//!
//! ```rust
//! use event_aggregator_core::types::{listener, payload_listener, same_listener};
//!
//! let on_tick = listener(|| println!("tick"));
//! let again = on_tick.clone();
//! assert!(same_listener(&on_tick, &again));
//!
//! let on_score = payload_listener(|score: &u32| println!("score {score}"));
//! # let _ = on_score;
//! ```

use std::sync::Arc;

// =============================================================================
// LISTENER TYPES
// =============================================================================

/// A listener invoked with no arguments.
///
/// Thread-safe, so it can be registered from one thread and invoked from
/// another.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// A listener invoked with a reference to the published value.
pub type PayloadListener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An ordered sequence of no-payload listeners.
pub type ListenerList = Vec<Listener>;

/// An ordered sequence of payload listeners for one event type.
pub type PayloadListenerList<T> = Vec<PayloadListener<T>>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Wrap a closure into a [`Listener`] handle.
#[inline]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure into a [`PayloadListener`] handle for event type `T`.
#[inline]
pub fn payload_listener<T, F>(f: F) -> PayloadListener<T>
where
    T: 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Check whether two handles refer to the same registered listener.
///
/// Only the data address is compared; vtable pointers of the same closure
/// may differ between codegen units.
#[inline]
pub fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
