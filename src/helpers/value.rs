// ============================================================================
// spark-observables - Value Helper
// Listener registry and old/new tracking for scalar observables
// ============================================================================

use std::cell::RefCell;

use super::{finish_dispatch, transition};
use crate::core::sink::ErrorSink;
use crate::core::types::{ChangeHandle, EqualsFn, InvalidationHandle, ObservableValue};
use crate::registry::{ListenerRegistry, NoListener, Strategy};

type Registry<T> = ListenerRegistry<ChangeHandle<T>, NoListener>;

struct ValueState<T> {
    registry: Registry<T>,
    /// Last value seen by change listeners. Only kept while there are any.
    current: Option<T>,
}

/// Listener registry of a scalar observable.
///
/// Change listeners get `(old, new)` pairs, so while any are registered the
/// helper keeps a copy of the last delivered value and compares every new
/// value against it with `equals`. Equal values fire invalidation only.
pub struct ValueHelper<T> {
    state: RefCell<ValueState<T>>,
    equals: EqualsFn<T>,
}

impl<T: Clone + 'static> ValueHelper<T> {
    /// Helper comparing values with `equals`.
    pub fn new(equals: EqualsFn<T>) -> Self {
        Self {
            state: RefCell::new(ValueState {
                registry: ListenerRegistry::default(),
                current: None,
            }),
            equals,
        }
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        let mut state = self.state.borrow_mut();
        transition(&mut state.registry, |r| r.add_invalidation(listener));
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        let mut state = self.state.borrow_mut();
        transition(&mut state.registry, |r| r.remove_invalidation(listener));
    }

    /// Register a change listener, caching `observable`'s value for the next `(old, new)` pair.
    pub fn add_change_listener<O: ObservableValue<T>>(&self, observable: &O, listener: ChangeHandle<T>) {
        let cached = self.state.borrow().current.is_some();
        let value = if cached { None } else { Some(observable.value()) };

        let mut state = self.state.borrow_mut();
        transition(&mut state.registry, |r| r.add_change(listener));
        if state.current.is_none() {
            state.current = value;
        }
    }

    /// Unregister a change listener. The cached value goes with the last one.
    pub fn remove_change_listener(&self, listener: &ChangeHandle<T>) {
        let mut state = self.state.borrow_mut();
        transition(&mut state.registry, |r| r.remove_change(listener));
        if !state.registry.has_change_listeners() {
            state.current = None;
        }
    }

    /// Notify listeners that `observable` may hold a new value.
    ///
    /// Invalidation listeners always run. Change listeners run only when the
    /// value differs from the one they saw last.
    pub fn fire_value_changed<O: ObservableValue<T>>(&self, observable: &O, sink: &ErrorSink) {
        let snapshot = self.state.borrow().registry.snapshot();
        if snapshot.is_empty() {
            return;
        }

        let delivery = if snapshot.has_change() {
            let new = observable.value();
            let mut state = self.state.borrow_mut();
            match state.current.replace(new.clone()) {
                Some(old) if (self.equals)(&old, &new) => None,
                Some(old) => Some((old, new)),
                None => None,
            }
        } else {
            None
        };

        snapshot.notify_invalidated(observable, sink);
        if let Some((old, new)) = delivery {
            snapshot.notify_changed(sink, |l| l.changed(observable, &old, &new));
        }

        finish_dispatch(snapshot, || self.prune_collected());
    }

    fn prune_collected(&self) {
        let mut state = self.state.borrow_mut();
        transition(&mut state.registry, ListenerRegistry::prune_collected);
        if !state.registry.has_change_listeners() {
            state.current = None;
        }
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Current registry representation.
    pub fn strategy(&self) -> Strategy {
        self.state.borrow().registry.strategy()
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.state.borrow().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().registry.is_empty()
    }

    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        self.state.borrow().registry.invalidation_listeners()
    }

    pub fn change_listeners(&self) -> Vec<ChangeHandle<T>> {
        self.state.borrow().registry.change_listeners()
    }
}

// =============================================================================
// TESTS
// =============================================================================
