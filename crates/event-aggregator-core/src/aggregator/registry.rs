//! Listener storage.
//!
//! Two independent maps keyed by [`TypeKey`]: one holding no-payload
//! listeners, one holding payload listeners. The no-payload map is
//! homogeneous. The payload map stores one type-erased slot per event type,
//! each slot owning a `Vec` of listeners for exactly that type; slots are
//! recovered with a checked downcast.
//!
//! A key is removed as soon as its sequence becomes empty, so an empty
//! sequence and an absent key never coexist.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{
    same_listener, Listener, ListenerList, PayloadListener, PayloadListenerList, TypeKey,
};

/// Type-erased view of a payload slot
trait ErasedPayloadSlot: Any + Send + Sync {
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Payload listeners for a single event type `T`
struct PayloadSlot<T: 'static> {
    listeners: PayloadListenerList<T>,
}

impl<T: 'static> PayloadSlot<T> {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T: 'static> ErasedPayloadSlot for PayloadSlot<T> {
    fn len(&self) -> usize {
        self.listeners.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Removes the first entry identical to `target`. Returns whether one was found.
fn remove_first<L: ?Sized>(list: &mut Vec<Arc<L>>, target: &Arc<L>) -> bool {
    match list.iter().position(|l| same_listener(l, target)) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

/// Both listener registries
#[derive(Default)]
pub(crate) struct Registries {
    plain: HashMap<TypeKey, ListenerList>,
    payload: HashMap<TypeKey, Box<dyn ErasedPayloadSlot>>,
}

impl Registries {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ---- no-payload registry ----

    pub(crate) fn push_plain(&mut self, key: TypeKey, listener: Listener) {
        self.plain.entry(key).or_default().push(listener);
    }

    pub(crate) fn remove_plain(&mut self, key: TypeKey, listener: &Listener) -> bool {
        let Some(list) = self.plain.get_mut(&key) else {
            return false;
        };
        let removed = remove_first(list, listener);
        if list.is_empty() {
            self.plain.remove(&key);
        }
        removed
    }

    pub(crate) fn contains_plain(&self, key: TypeKey, listener: &Listener) -> bool {
        self.plain
            .get(&key)
            .is_some_and(|list| list.iter().any(|l| same_listener(l, listener)))
    }

    pub(crate) fn snapshot_plain(&self, key: TypeKey) -> ListenerList {
        self.plain.get(&key).cloned().unwrap_or_default()
    }

    pub(crate) fn plain_len(&self, key: TypeKey) -> usize {
        self.plain.get(&key).map_or(0, Vec::len)
    }

    // ---- payload registry ----

    fn payload_slot<T: 'static>(&self) -> Option<&PayloadSlot<T>> {
        self.payload
            .get(&TypeKey::of::<T>())
            .and_then(|slot| slot.as_any().downcast_ref::<PayloadSlot<T>>())
    }

    fn payload_slot_mut<T: 'static>(&mut self) -> Option<&mut PayloadSlot<T>> {
        self.payload
            .get_mut(&TypeKey::of::<T>())
            .and_then(|slot| slot.as_any_mut().downcast_mut::<PayloadSlot<T>>())
    }

    pub(crate) fn push_payload<T: 'static>(&mut self, listener: PayloadListener<T>) {
        if let Some(slot) = self.payload_slot_mut::<T>() {
            slot.listeners.push(listener);
            return;
        }

        let mut slot = PayloadSlot::<T>::new();
        slot.listeners.push(listener);
        self.payload.insert(TypeKey::of::<T>(), Box::new(slot));
    }

    pub(crate) fn remove_payload<T: 'static>(&mut self, listener: &PayloadListener<T>) -> bool {
        let Some(slot) = self.payload_slot_mut::<T>() else {
            return false;
        };
        let removed = remove_first(&mut slot.listeners, listener);
        if slot.listeners.is_empty() {
            self.payload.remove(&TypeKey::of::<T>());
        }
        removed
    }

    pub(crate) fn contains_payload<T: 'static>(&self, listener: &PayloadListener<T>) -> bool {
        self.payload_slot::<T>()
            .is_some_and(|slot| slot.listeners.iter().any(|l| same_listener(l, listener)))
    }

    pub(crate) fn snapshot_payload<T: 'static>(&self) -> PayloadListenerList<T> {
        self.payload_slot::<T>()
            .map(|slot| slot.listeners.clone())
            .unwrap_or_default()
    }

    pub(crate) fn payload_len(&self, key: TypeKey) -> usize {
        self.payload.get(&key).map_or(0, |slot| slot.len())
    }

    // ---- both registries ----

    /// Drops every listener for `key` from both registries.
    /// Returns the number of (no-payload, payload) entries removed.
    pub(crate) fn remove_type(&mut self, key: TypeKey) -> (usize, usize) {
        let plain = self.plain.remove(&key).map_or(0, |list| list.len());
        let payload = self.payload.remove(&key).map_or(0, |slot| slot.len());
        (plain, payload)
    }

    pub(crate) fn clear(&mut self) {
        self.plain.clear();
        self.payload.clear();
    }

    /// Number of distinct event types with at least one listener in either registry
    pub(crate) fn type_count(&self) -> usize {
        self.plain.len()
            + self
                .payload
                .keys()
                .filter(|key| !self.plain.contains_key(*key))
                .count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.plain.is_empty() && self.payload.is_empty()
    }

    pub(crate) fn total_len(&self) -> usize {
        self.plain.values().map(Vec::len).sum::<usize>()
            + self.payload.values().map(|slot| slot.len()).sum::<usize>()
    }
}
