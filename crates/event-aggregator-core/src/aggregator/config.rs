//! Aggregator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the event aggregator
///
/// Both switches only affect log output; dispatch semantics are the same
/// regardless of configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAggregatorConfig {
    /// Log at debug level when an event is published with no listener in
    /// either registry.
    pub report_unhandled: bool,
    /// Emit a trace record for every listener invocation.
    pub trace_dispatch: bool,
}

impl EventAggregatorConfig {
    /// Configuration with every diagnostic switch enabled
    pub fn verbose() -> Self {
        Self {
            report_unhandled: true,
            trace_dispatch: true,
        }
    }
}
