// ============================================================================
// spark-observables - Weak Listeners
// Pruning collected listeners and weak listener wrappers
// ============================================================================

use std::rc::{Rc, Weak};

use super::ListenerEntry;
use crate::changes::{ArrayChange, ListChange, MapChange, SetChange};
use crate::core::types::{
    ArrayChangeListener, ChangeListener, InvalidationListener, ListChangeListener,
    MapChangeListener, Observable, ObservableValue, SetChangeListener,
};

// =============================================================================
// PRUNING
// =============================================================================

/// Compact the first `len` slots in place, dropping collected listeners.
///
/// Survivors keep their relative order and move to the front; every slot
/// from the returned length up to the old `len` is cleared.
pub fn prune_collected<L: ListenerEntry>(slots: &mut [Option<L>], len: usize) -> usize {
    let mut kept = 0;
    for index in 0..len {
        let collected = match &slots[index] {
            Some(listener) => listener.was_garbage_collected(),
            None => true,
        };
        if collected {
            slots[index] = None;
        } else {
            slots.swap(kept, index);
            kept += 1;
        }
    }
    if kept < len {
        tracing::trace!(removed = len - kept, remaining = kept, "pruned collected listeners");
    }
    kept
}

// =============================================================================
// WEAK LISTENER
// =============================================================================

/// A listener that does not keep its target alive.
///
/// Once every strong `Rc` to the target is dropped the wrapper reports
/// itself as collected; registries skip it on delivery and prune it at the
/// next opportunity. Equality is by wrapper, so keep the returned handle
/// around if you want to remove it explicitly.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use spark_observables::{InvalidationListener, Observable, SimpleProperty, WeakListener};
///
/// let prop = SimpleProperty::new(0);
/// let target: Rc<dyn InvalidationListener> = Rc::new(|_: &dyn Observable| {});
/// prop.add_invalidation_listener(WeakListener::invalidation(&target));
///
/// drop(target);
/// assert!(prop.invalidation_listeners()[0].was_garbage_collected());
/// ```
pub struct WeakListener<L: ?Sized> {
    target: Weak<L>,
}

impl<L: ?Sized> WeakListener<L> {
    /// Wrap `target` without keeping it alive.
    pub fn new(target: &Rc<L>) -> Self {
        Self {
            target: Rc::downgrade(target),
        }
    }

    /// The target, if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<L>> {
        self.target.upgrade()
    }

    /// Whether any strong reference to the target remains.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl WeakListener<dyn InvalidationListener> {
    /// Weak invalidation listener handle for `target`.
    pub fn invalidation(target: &Rc<dyn InvalidationListener>) -> Rc<dyn InvalidationListener> {
        Rc::new(Self::new(target))
    }
}

impl<T: 'static> WeakListener<dyn ChangeListener<T>> {
    /// Weak change listener handle for `target`.
    pub fn change(target: &Rc<dyn ChangeListener<T>>) -> Rc<dyn ChangeListener<T>> {
        Rc::new(Self::new(target))
    }
}

impl InvalidationListener for WeakListener<dyn InvalidationListener> {
    fn invalidated(&self, observable: &dyn Observable) {
        if let Some(target) = self.upgrade() {
            target.invalidated(observable);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

impl<T> ChangeListener<T> for WeakListener<dyn ChangeListener<T>> {
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T) {
        if let Some(target) = self.upgrade() {
            target.changed(observable, old, new);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

impl<E> ListChangeListener<E> for WeakListener<dyn ListChangeListener<E>> {
    fn on_changed(&self, change: &ListChange<E>) {
        if let Some(target) = self.upgrade() {
            target.on_changed(change);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

impl<E> SetChangeListener<E> for WeakListener<dyn SetChangeListener<E>> {
    fn on_changed(&self, change: &SetChange<E>) {
        if let Some(target) = self.upgrade() {
            target.on_changed(change);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

impl<K, V> MapChangeListener<K, V> for WeakListener<dyn MapChangeListener<K, V>> {
    fn on_changed(&self, change: &MapChange<K, V>) {
        if let Some(target) = self.upgrade() {
            target.on_changed(change);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

impl<N> ArrayChangeListener<N> for WeakListener<dyn ArrayChangeListener<N>> {
    fn on_changed(&self, change: &ArrayChange<N>) {
        if let Some(target) = self.upgrade() {
            target.on_changed(change);
        }
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_alive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
