// ============================================================================
// spark-observables - Collection Helper
// Listener registry of a raw observable collection or array
// ============================================================================

use std::cell::RefCell;

use super::{StructuralHandle, finish_dispatch, transition};
use crate::core::sink::ErrorSink;
use crate::core::types::{InvalidationHandle, Observable};
use crate::registry::{ListenerRegistry, NoListener, Strategy};

/// Listener registry of a collection that reports structural changes.
///
/// Collections have no whole-value change listeners; their change category
/// is `NoListener`.
pub struct CollectionHelper<S> {
    registry: RefCell<ListenerRegistry<NoListener, S>>,
}

impl<S: StructuralHandle> CollectionHelper<S> {
    /// Helper with no listeners.
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(ListenerRegistry::default()),
        }
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        transition(&mut *self.registry.borrow_mut(), |r| r.add_invalidation(listener));
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        transition(&mut *self.registry.borrow_mut(), |r| r.remove_invalidation(listener));
    }

    /// Register a structural listener.
    pub fn add_listener(&self, listener: S) {
        transition(&mut *self.registry.borrow_mut(), |r| r.add_structural(listener));
    }

    /// Unregister a structural listener.
    pub fn remove_listener(&self, listener: &S) {
        transition(&mut *self.registry.borrow_mut(), |r| r.remove_structural(listener));
    }

    /// Notify listeners of one mutation.
    ///
    /// `emit` runs only when structural listeners are registered; it builds
    /// the change records and hands each one to the callback it receives.
    pub fn fire(
        &self,
        observable: &dyn Observable,
        sink: &ErrorSink,
        emit: impl FnOnce(&mut dyn FnMut(&S::Change)),
    ) {
        let snapshot = self.registry.borrow().snapshot();
        if snapshot.is_empty() {
            return;
        }

        snapshot.notify_invalidated(observable, sink);
        if snapshot.has_structural() {
            emit(&mut |change: &S::Change| {
                snapshot.notify_structural(sink, |l| l.deliver(change));
            });
        }

        finish_dispatch(snapshot, || {
            transition(&mut *self.registry.borrow_mut(), ListenerRegistry::prune_collected);
        });
    }

    /// Current registry representation.
    pub fn strategy(&self) -> Strategy {
        self.registry.borrow().strategy()
    }

    /// Whether any listener of either category is registered.
    pub fn has_listeners(&self) -> bool {
        !self.registry.borrow().is_empty()
    }

    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        self.registry.borrow().invalidation_listeners()
    }

    /// Registered structural listeners.
    pub fn listeners(&self) -> Vec<S> {
        self.registry.borrow().structural_listeners()
    }
}

impl<S: StructuralHandle> Default for CollectionHelper<S> {
    fn default() -> Self {
        Self::new()
    }
}
