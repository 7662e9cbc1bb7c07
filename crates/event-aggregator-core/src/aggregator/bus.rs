//! Event aggregator implementation.
//!
//! Provides the core EventAggregator struct and an optional process-wide
//! instance for hosts that prefer ambient access.

use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::config::EventAggregatorConfig;
use super::registry::Registries;
use crate::error::{DispatchPass, EventAggregatorError, Result};
use crate::types::{Listener, PayloadListener, TypeKey};

/// Type-keyed publish/subscribe registry
///
/// Listeners are registered per event type in one of two independent
/// registries: no-payload listeners are invoked without arguments, payload
/// listeners receive a reference to the published value. Publishing invokes
/// the no-payload pass and then the payload pass, each in registration
/// order, on the caller's thread.
///
/// Each pass works on a snapshot of the listener sequence taken under the
/// read lock; the lock is released before any listener runs. A listener may
/// therefore subscribe or unsubscribe on the same aggregator; the change
/// applies from the next publish onwards.
pub struct EventAggregator {
    /// Listener registries
    registries: RwLock<Registries>,
    /// Configuration
    config: EventAggregatorConfig,
}

impl EventAggregator {
    /// Create a new, empty aggregator with default configuration
    pub fn new() -> Self {
        Self::with_config(EventAggregatorConfig::default())
    }

    /// Create a new, empty aggregator with custom configuration
    pub fn with_config(config: EventAggregatorConfig) -> Self {
        Self {
            registries: RwLock::new(Registries::new()),
            config,
        }
    }

    /// Subscribe a no-payload listener to events of type `T`
    ///
    /// The same handle may be subscribed several times; it is then invoked
    /// once per registration.
    pub fn subscribe<T: 'static>(&self, listener: Listener) {
        let key = TypeKey::of::<T>();
        self.registries.write().push_plain(key, listener);
        tracing::debug!("No-payload listener subscribed to {}", key);
    }

    /// Subscribe a payload listener to events of type `T`
    pub fn subscribe_with_payload<T: 'static>(&self, listener: PayloadListener<T>) {
        self.registries.write().push_payload::<T>(listener);
        tracing::debug!("Payload listener subscribed to {}", TypeKey::of::<T>());
    }

    /// Unsubscribe a no-payload listener from events of type `T`
    ///
    /// Removes only the earliest registration of this handle. Returns true if
    /// a registration was found and removed.
    pub fn unsubscribe<T: 'static>(&self, listener: &Listener) -> bool {
        let key = TypeKey::of::<T>();
        let removed = self.registries.write().remove_plain(key, listener);
        if removed {
            tracing::debug!("No-payload listener unsubscribed from {}", key);
        }
        removed
    }

    /// Unsubscribe a payload listener from events of type `T`
    ///
    /// Returns true if a registration was found and removed.
    pub fn unsubscribe_with_payload<T: 'static>(&self, listener: &PayloadListener<T>) -> bool {
        let removed = self.registries.write().remove_payload::<T>(listener);
        if removed {
            tracing::debug!("Payload listener unsubscribed from {}", TypeKey::of::<T>());
        }
        removed
    }

    /// Remove every listener for events of type `T` from both registries
    ///
    /// Returns the number of registrations removed.
    pub fn unsubscribe_all_of<T: 'static>(&self) -> usize {
        let key = TypeKey::of::<T>();
        let (plain, payload) = self.registries.write().remove_type(key);
        if plain + payload > 0 {
            tracing::debug!(
                "Removed {} no-payload and {} payload listeners for {}",
                plain,
                payload,
                key
            );
        }
        plain + payload
    }

    /// Remove every listener for every event type
    pub fn unsubscribe_all(&self) {
        let mut registries = self.registries.write();
        let removed = registries.total_len();
        registries.clear();
        tracing::debug!("Removed all {} listeners", removed);
    }

    /// Check whether this no-payload listener is subscribed to events of type `T`
    pub fn is_subscribed<T: 'static>(&self, listener: &Listener) -> bool {
        self.registries
            .read()
            .contains_plain(TypeKey::of::<T>(), listener)
    }

    /// Check whether this payload listener is subscribed to events of type `T`
    pub fn is_subscribed_with_payload<T: 'static>(&self, listener: &PayloadListener<T>) -> bool {
        self.registries.read().contains_payload::<T>(listener)
    }

    /// Publish an event to every listener subscribed to its type
    ///
    /// A panicking listener unwinds into the caller; the remaining listeners
    /// are not invoked. Use [`try_publish`](Self::try_publish) to get the
    /// failure back as an error instead.
    pub fn publish<T: 'static>(&self, event: T) {
        let Ok(()) = self.dispatch(&event, |_, _, invoke| {
            invoke();
            Ok::<(), Infallible>(())
        });
    }

    /// Publish a default-constructed event of type `T`
    ///
    /// Intended for marker events that carry no data.
    pub fn publish_default<T: Default + 'static>(&self) {
        self.publish(T::default());
    }

    /// Publish an event, converting a listener panic into an error
    ///
    /// Dispatch stops at the first panicking listener. The aggregator is
    /// left untouched and can be used again immediately.
    pub fn try_publish<T: 'static>(&self, event: T) -> Result<()> {
        let key = TypeKey::of::<T>();
        self.dispatch(&event, |pass, index, invoke| {
            panic::catch_unwind(AssertUnwindSafe(invoke)).map_err(|payload| {
                let err = EventAggregatorError::listener_panicked(key.name(), pass, index, payload);
                tracing::warn!("{}", err);
                err
            })
        })
    }

    /// Run both dispatch passes for `event`, routing every invocation through `call`
    fn dispatch<T, E, F>(&self, event: &T, mut call: F) -> std::result::Result<(), E>
    where
        T: 'static,
        F: FnMut(DispatchPass, usize, &mut dyn FnMut()) -> std::result::Result<(), E>,
    {
        let key = TypeKey::of::<T>();
        tracing::trace!("Publishing {}", key);

        let listeners = self.registries.read().snapshot_plain(key);
        for (index, listener) in listeners.iter().enumerate() {
            self.trace_invocation(key, DispatchPass::NoPayload, index);
            call(DispatchPass::NoPayload, index, &mut || listener())?;
        }

        let payload_listeners = self.registries.read().snapshot_payload::<T>();
        for (index, listener) in payload_listeners.iter().enumerate() {
            self.trace_invocation(key, DispatchPass::Payload, index);
            call(DispatchPass::Payload, index, &mut || listener(event))?;
        }

        if self.config.report_unhandled && listeners.is_empty() && payload_listeners.is_empty() {
            tracing::debug!("No listeners for {}", key);
        }

        Ok(())
    }

    fn trace_invocation(&self, key: TypeKey, pass: DispatchPass, index: usize) {
        if self.config.trace_dispatch {
            tracing::trace!("Invoking {} listener #{} for {}", pass, index, key);
        }
    }

    /// Number of no-payload listeners registered for `T`
    pub fn listener_count<T: 'static>(&self) -> usize {
        self.registries.read().plain_len(TypeKey::of::<T>())
    }

    /// Number of payload listeners registered for `T`
    pub fn payload_listener_count<T: 'static>(&self) -> usize {
        self.registries.read().payload_len(TypeKey::of::<T>())
    }

    /// Check whether publishing `T` would invoke anything
    pub fn has_listeners<T: 'static>(&self) -> bool {
        let key = TypeKey::of::<T>();
        let registries = self.registries.read();
        registries.plain_len(key) + registries.payload_len(key) > 0
    }

    /// Number of event types with at least one listener
    pub fn subscribed_type_count(&self) -> usize {
        self.registries.read().type_count()
    }

    /// Check whether no listener is registered at all
    pub fn is_empty(&self) -> bool {
        self.registries.read().is_empty()
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventAggregatorConfig {
        &self.config
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registries = self.registries.read();
        f.debug_struct("EventAggregator")
            .field("event_types", &registries.type_count())
            .field("listeners", &registries.total_len())
            .field("config", &self.config)
            .finish()
    }
}

/// Global event aggregator instance
static EVENT_AGGREGATOR: OnceLock<EventAggregator> = OnceLock::new();

/// Get or initialize the global event aggregator
pub fn event_aggregator() -> &'static EventAggregator {
    EVENT_AGGREGATOR.get_or_init(EventAggregator::new)
}

/// Initialize the global event aggregator with custom configuration
///
/// Must be called before any call to `event_aggregator()`. Returns the
/// rejected configuration if the global instance already exists.
pub fn init_event_aggregator(
    config: EventAggregatorConfig,
) -> std::result::Result<(), EventAggregatorConfig> {
    EVENT_AGGREGATOR
        .set(EventAggregator::with_config(config))
        .map_err(|aggregator| aggregator.config)
}

/// Publish an event on the global event aggregator
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::aggregator::event_aggregator().publish($event)
    };
}

/// Subscribe a closure to an event type on the global event aggregator
///
/// Expands to the [`PayloadListener`](crate::types::PayloadListener) handle
/// so the caller can unsubscribe later.
#[macro_export]
macro_rules! on_event {
    ($event:ty, $handler:expr) => {{
        let handle = $crate::types::payload_listener::<$event, _>($handler);
        $crate::aggregator::event_aggregator().subscribe_with_payload::<$event>(handle.clone());
        handle
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{listener, payload_listener};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Tick;

    #[derive(Debug, Clone, PartialEq)]
    struct Score(u32);

    fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let handle = listener(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        (handle, counter)
    }

    #[test]
    fn test_aggregator_creation() {
        let aggregator = EventAggregator::new();
        assert!(aggregator.is_empty());
        assert_eq!(aggregator.subscribed_type_count(), 0);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let aggregator = EventAggregator::new();
        let (handle, _) = counting_listener();

        assert!(!aggregator.is_subscribed::<Tick>(&handle));
        aggregator.subscribe::<Tick>(handle.clone());
        assert!(aggregator.is_subscribed::<Tick>(&handle));
        assert_eq!(aggregator.listener_count::<Tick>(), 1);
        assert!(aggregator.has_listeners::<Tick>());

        assert!(aggregator.unsubscribe::<Tick>(&handle));
        assert!(!aggregator.is_subscribed::<Tick>(&handle));
        assert!(!aggregator.has_listeners::<Tick>());

        // Double unsubscribe should return false
        assert!(!aggregator.unsubscribe::<Tick>(&handle));
    }

    #[test]
    fn test_registries_are_separate() {
        let aggregator = EventAggregator::new();
        let (handle, _) = counting_listener();

        aggregator.subscribe::<Tick>(handle.clone());
        assert!(aggregator.is_subscribed::<Tick>(&handle));
        assert!(!aggregator.is_subscribed::<Score>(&handle));
        assert_eq!(aggregator.payload_listener_count::<Tick>(), 0);
    }

    #[test]
    fn test_event_delivery() {
        let aggregator = EventAggregator::new();
        let (handle, counter) = counting_listener();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();

        aggregator.subscribe::<Score>(handle);
        aggregator.subscribe_with_payload::<Score>(payload_listener(move |score: &Score| {
            received_clone.lock().push(score.clone());
        }));

        aggregator.publish(Score(42));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(*received.lock(), vec![Score(42)]);
    }

    #[test]
    fn test_no_payload_pass_runs_first() {
        let aggregator = EventAggregator::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = order.clone();
        aggregator.subscribe_with_payload::<Score>(payload_listener(move |_: &Score| {
            o.lock().push("payload");
        }));
        let o = order.clone();
        aggregator.subscribe::<Score>(listener(move || o.lock().push("plain")));

        aggregator.publish(Score(1));
        assert_eq!(*order.lock(), vec!["plain", "payload"]);
    }

    #[test]
    fn test_publish_without_listeners() {
        let aggregator = EventAggregator::with_config(EventAggregatorConfig::verbose());
        aggregator.publish(Score(7));
        aggregator.publish_default::<Tick>();
        assert!(aggregator.is_empty());
    }

    /// Writer handing formatted log lines to a shared buffer
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a thread-local subscriber and return everything it logged
    fn capture_logs<F: FnOnce()>(f: F) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || LogSink(sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.lock().clone();
        String::from_utf8(bytes).expect("log output should be UTF-8")
    }

    #[test]
    fn test_report_unhandled_logs_missing_listeners() {
        let reporting = EventAggregator::with_config(EventAggregatorConfig {
            report_unhandled: true,
            ..Default::default()
        });
        let logs = capture_logs(|| reporting.publish(Score(1)));
        assert!(logs.contains("No listeners for"));

        let quiet = EventAggregator::new();
        let logs = capture_logs(|| quiet.publish(Score(1)));
        assert!(!logs.contains("No listeners for"));

        // A handled event is never reported
        reporting.subscribe::<Score>(listener(|| {}));
        let logs = capture_logs(|| reporting.publish(Score(1)));
        assert!(!logs.contains("No listeners for"));
    }

    #[test]
    fn test_trace_dispatch_logs_each_invocation() {
        let tracing_on = EventAggregator::with_config(EventAggregatorConfig {
            trace_dispatch: true,
            ..Default::default()
        });
        tracing_on.subscribe::<Score>(listener(|| {}));
        tracing_on.subscribe_with_payload::<Score>(payload_listener(|_: &Score| {}));
        tracing_on.subscribe_with_payload::<Score>(payload_listener(|_: &Score| {}));

        let logs = capture_logs(|| tracing_on.publish(Score(2)));
        assert!(logs.contains("Invoking no-payload listener #0"));
        assert!(logs.contains("Invoking payload listener #0"));
        assert!(logs.contains("Invoking payload listener #1"));

        let tracing_off = EventAggregator::new();
        tracing_off.subscribe::<Score>(listener(|| {}));
        let logs = capture_logs(|| tracing_off.publish(Score(2)));
        assert!(logs.contains("Publishing"));
        assert!(!logs.contains("Invoking"));
    }

    #[test]
    fn test_publish_default() {
        let aggregator = EventAggregator::new();
        let values = Arc::new(Mutex::new(Vec::new()));
        let v = values.clone();
        aggregator.subscribe_with_payload::<u32>(payload_listener(move |n: &u32| v.lock().push(*n)));

        aggregator.publish_default::<u32>();
        assert_eq!(*values.lock(), vec![0]);
    }

    #[test]
    fn test_unsubscribe_all_of_type() {
        let aggregator = EventAggregator::new();
        let (tick, tick_count) = counting_listener();
        let (score, score_count) = counting_listener();

        aggregator.subscribe::<Tick>(tick.clone());
        aggregator.subscribe_with_payload::<Tick>(payload_listener(|_: &Tick| {}));
        aggregator.subscribe::<Score>(score);

        assert_eq!(aggregator.unsubscribe_all_of::<Tick>(), 2);
        assert_eq!(aggregator.payload_listener_count::<Tick>(), 0);
        assert!(!aggregator.is_subscribed::<Tick>(&tick));

        aggregator.publish(Tick);
        aggregator.publish(Score(1));
        assert_eq!(tick_count.load(Ordering::SeqCst), 0);
        assert_eq!(score_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_all() {
        let aggregator = EventAggregator::new();
        let (handle, counter) = counting_listener();

        aggregator.subscribe::<Tick>(handle.clone());
        aggregator.subscribe::<Score>(handle);
        aggregator.subscribe_with_payload::<Score>(payload_listener(|_: &Score| {}));
        assert_eq!(aggregator.subscribed_type_count(), 2);

        aggregator.unsubscribe_all();
        assert!(aggregator.is_empty());

        aggregator.publish(Tick);
        aggregator.publish(Score(3));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_try_publish_reports_panic() {
        let aggregator = EventAggregator::new();
        let (before, before_count) = counting_listener();
        let (after, after_count) = counting_listener();

        aggregator.subscribe::<Score>(before);
        aggregator.subscribe_with_payload::<Score>(payload_listener(|score: &Score| {
            panic!("score {} rejected", score.0);
        }));
        aggregator.subscribe_with_payload::<Score>(payload_listener(move |_: &Score| after()));

        let err = aggregator
            .try_publish(Score(9))
            .expect_err("listener should panic");

        match err {
            EventAggregatorError::ListenerPanicked {
                pass,
                index,
                message,
                event_type,
            } => {
                assert_eq!(pass, DispatchPass::Payload);
                assert_eq!(index, 0);
                assert_eq!(message, "score 9 rejected");
                assert!(event_type.ends_with("Score"));
            }
        }
        assert_eq!(before_count.load(Ordering::SeqCst), 1);
        assert_eq!(after_count.load(Ordering::SeqCst), 0);

        // Aggregator still usable
        assert_eq!(aggregator.payload_listener_count::<Score>(), 2);
    }

    #[test]
    fn test_try_publish_ok() {
        let aggregator = EventAggregator::new();
        let (handle, counter) = counting_listener();
        aggregator.subscribe::<Tick>(handle);

        assert!(aggregator.try_publish(Tick).is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output() {
        let aggregator = EventAggregator::new();
        aggregator.subscribe::<Tick>(listener(|| {}));
        let debug = format!("{:?}", aggregator);
        assert!(debug.contains("event_types: 1"));
        assert!(debug.contains("listeners: 1"));
    }

    #[test]
    fn test_global_macros() {
        #[derive(Debug)]
        struct GlobalPing(u8);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let handle = crate::on_event!(GlobalPing, move |ping: &GlobalPing| {
            seen_clone.fetch_add(ping.0 as usize, Ordering::SeqCst);
        });

        crate::emit!(GlobalPing(3));
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        assert!(event_aggregator().unsubscribe_with_payload::<GlobalPing>(&handle));
        crate::emit!(GlobalPing(3));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
