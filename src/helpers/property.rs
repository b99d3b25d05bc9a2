// ============================================================================
// spark-observables - Collection Property Helper
// Listener registry and change synthesis for collection-valued properties
// ============================================================================
//
// A collection property holds `Option<C>` where `C` is an observable
// collection. It has all three listener categories:
//
// - replacing the collection fires change listeners with the old and new
//   instances, and structural listeners with a diff synthesized from the
//   two contents (one coalesced edit for lists, one record per element for
//   sets and maps)
// - a structural change of the current collection fires change listeners
//   with (current, current) and structural listeners with the adapted diff
//
// Diffs are only built when structural listeners are registered.
// ============================================================================

use std::cell::RefCell;

use super::{SourceForwarder, StructuralHandle, finish_dispatch, transition};
use crate::core::sink::ErrorSink;
use crate::core::types::{ChangeHandle, InvalidationHandle, ObservableValue};
use crate::registry::{ListenerRegistry, Strategy};

/// An observable collection that a property can hold.
pub trait Diffable: Clone + 'static {
    type Change: 'static;
    type Handle: StructuralHandle<Change = Self::Change>;

    /// Same underlying collection (not just equal contents).
    fn same_instance(&self, other: &Self) -> bool;

    fn add_structural_listener(&self, listener: Self::Handle);

    fn remove_structural_listener(&self, listener: &Self::Handle);

    fn forwarding_listener(forwarder: SourceForwarder<Self::Change>) -> Self::Handle;

    /// Describe the replacement of `old` by `new` as structural changes.
    fn synthesize(old: Option<&Self>, new: Option<&Self>, emit: &mut dyn FnMut(&Self::Change));

    /// Re-express a change of `current` as seen through the property.
    fn adapt(change: &Self::Change, current: &Self) -> Self::Change;
}

fn same_value<C: Diffable>(a: &Option<C>, b: &Option<C>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_instance(b),
        (None, None) => true,
        _ => false,
    }
}

type Registry<C> = ListenerRegistry<ChangeHandle<Option<C>>, <C as Diffable>::Handle>;

struct PropertyState<C: Diffable> {
    registry: Registry<C>,
    current: Option<C>,
}

/// Listener registry of a property holding an observable collection.
pub struct CollectionPropertyHelper<C: Diffable> {
    state: RefCell<PropertyState<C>>,
}

impl<C: Diffable> CollectionPropertyHelper<C> {
    /// Helper for a property currently holding `initial`.
    pub fn new(initial: Option<C>) -> Self {
        Self {
            state: RefCell::new(PropertyState {
                registry: ListenerRegistry::default(),
                current: initial,
            }),
        }
    }

    fn update(&self, step: impl FnOnce(Registry<C>) -> Registry<C>) {
        transition(&mut self.state.borrow_mut().registry, step);
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.update(|r| r.add_invalidation(listener));
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.update(|r| r.remove_invalidation(listener));
    }

    pub fn add_change_listener(&self, listener: ChangeHandle<Option<C>>) {
        self.update(|r| r.add_change(listener));
    }

    pub fn remove_change_listener(&self, listener: &ChangeHandle<Option<C>>) {
        self.update(|r| r.remove_change(listener));
    }

    /// Register a structural listener.
    pub fn add_structural_listener(&self, listener: C::Handle) {
        self.update(|r| r.add_structural(listener));
    }

    /// Unregister a structural listener.
    pub fn remove_structural_listener(&self, listener: &C::Handle) {
        self.update(|r| r.remove_structural(listener));
    }

    /// The property now holds `observable.value()`; notify listeners.
    ///
    /// Holding the same collection instance as before fires invalidation
    /// listeners only.
    pub fn fire_value_changed<O: ObservableValue<Option<C>>>(&self, observable: &O, sink: &ErrorSink) {
        let new = observable.value();
        let (snapshot, old) = {
            let mut state = self.state.borrow_mut();
            let old = std::mem::replace(&mut state.current, new.clone());
            (state.registry.snapshot(), old)
        };
        if snapshot.is_empty() {
            return;
        }

        snapshot.notify_invalidated(observable, sink);
        if !same_value(&old, &new) {
            snapshot.notify_changed(sink, |l| l.changed(observable, &old, &new));
            if snapshot.has_structural() {
                C::synthesize(old.as_ref(), new.as_ref(), &mut |change| {
                    snapshot.notify_structural(sink, |l| l.deliver(change));
                });
            }
        }

        finish_dispatch(snapshot, || self.update(ListenerRegistry::prune_collected));
    }

    /// The current collection changed in place; forward `change`.
    pub fn fire_source_changed<O: ObservableValue<Option<C>>>(
        &self,
        observable: &O,
        change: &C::Change,
        sink: &ErrorSink,
    ) {
        let (snapshot, current) = {
            let state = self.state.borrow();
            (state.registry.snapshot(), state.current.clone())
        };
        if snapshot.is_empty() {
            return;
        }

        snapshot.notify_invalidated(observable, sink);
        snapshot.notify_changed(sink, |l| l.changed(observable, &current, &current));
        if snapshot.has_structural() {
            if let Some(current) = &current {
                let adapted = C::adapt(change, current);
                snapshot.notify_structural(sink, |l| l.deliver(&adapted));
            }
        }

        finish_dispatch(snapshot, || self.update(ListenerRegistry::prune_collected));
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Current registry representation.
    pub fn strategy(&self) -> Strategy {
        self.state.borrow().registry.strategy()
    }

    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        self.state.borrow().registry.invalidation_listeners()
    }

    pub fn change_listeners(&self) -> Vec<ChangeHandle<Option<C>>> {
        self.state.borrow().registry.change_listeners()
    }

    pub fn structural_listeners(&self) -> Vec<C::Handle> {
        self.state.borrow().registry.structural_listeners()
    }
}
