//! # Event Aggregator Module
//!
//! Type-keyed publish/subscribe for decoupled communication between
//! application components.
//!
//! ## Overview
//!
//! - Publishers broadcast a value of some type `T` without knowing who listens
//! - Subscribers register for `T`, either with or without receiving the value
//! - Dispatch is synchronous, in registration order, on the publishing thread
//!
//! ## Usage
//!
//! ```rust
//! use event_aggregator_core::aggregator::EventAggregator;
//! use event_aggregator_core::types::{listener, payload_listener};
//!
//! struct Tick;
//! struct Score(u32);
//!
//! let aggregator = EventAggregator::new();
//!
//! let on_tick = listener(|| println!("tick"));
//! aggregator.subscribe::<Tick>(on_tick.clone());
//! aggregator.subscribe_with_payload::<Score>(payload_listener(|score: &Score| {
//!     println!("score: {}", score.0);
//! }));
//!
//! aggregator.publish(Score(42));
//! aggregator.publish(Tick);
//!
//! // Unsubscribe when done
//! aggregator.unsubscribe::<Tick>(&on_tick);
//! ```

mod bus;
mod config;
mod registry;

pub use bus::*;
pub use config::*;
