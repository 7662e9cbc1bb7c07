//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Listener handle aliases and constructor helpers.
//! - [`key`]: [`TypeKey`], the registry key derived from an event type.

pub mod aliases;
pub mod key;

pub use aliases::*;
pub use key::TypeKey;
