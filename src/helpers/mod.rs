// ============================================================================
// spark-observables - Helpers
// Per-kind glue between an observable and its listener registry
// ============================================================================
//
// An observable owns exactly one helper. The helper keeps the registry in a
// RefCell, swaps it for the next strategy on every add/remove, and runs a
// notification off a snapshot so listeners can re-enter the observable.
//
//   ValueHelper<T>              scalar properties (invalidation + change)
//   CollectionHelper<S>         raw collections (invalidation + structural)
//   CollectionPropertyHelper<C> collection-valued properties (all three)
// ============================================================================

mod collection;
mod property;
mod value;

use std::rc::{Rc, Weak};

use crate::changes::{ArrayChange, ListChange, MapChange, SetChange};
use crate::core::types::{
    ArrayChangeHandle, ListChangeHandle, ListChangeListener, MapChangeHandle, MapChangeListener,
    SetChangeHandle, SetChangeListener,
};
use crate::registry::{ListenerEntry, ListenerRegistry, Snapshot};

pub use collection::CollectionHelper;
pub use property::{CollectionPropertyHelper, Diffable};
pub use value::ValueHelper;

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Replace `registry` with the result of `step`, tracing strategy changes.
pub(crate) fn transition<C: ListenerEntry, S: ListenerEntry>(
    registry: &mut ListenerRegistry<C, S>,
    step: impl FnOnce(ListenerRegistry<C, S>) -> ListenerRegistry<C, S>,
) {
    let before = registry.strategy();
    *registry = step(std::mem::take(registry));
    let after = registry.strategy();
    if before != after {
        tracing::trace!(from = ?before, to = ?after, listeners = registry.len(), "listener strategy changed");
    }
}

/// Drop the snapshot, then prune if the dispatch ran into collected listeners.
pub(crate) fn finish_dispatch<C: ListenerEntry, S: ListenerEntry>(
    snapshot: Snapshot<C, S>,
    prune: impl FnOnce(),
) {
    let collected = snapshot.saw_collected();
    drop(snapshot);
    if collected {
        prune();
    }
}

// =============================================================================
// STRUCTURAL HANDLES
// =============================================================================

/// A structural listener handle and the change record it receives.
pub trait StructuralHandle: ListenerEntry {
    type Change;

    fn deliver(&self, change: &Self::Change);
}

impl<E: 'static> StructuralHandle for ListChangeHandle<E> {
    type Change = ListChange<E>;

    fn deliver(&self, change: &ListChange<E>) {
        self.on_changed(change)
    }
}

impl<E: 'static> StructuralHandle for SetChangeHandle<E> {
    type Change = SetChange<E>;

    fn deliver(&self, change: &SetChange<E>) {
        self.on_changed(change)
    }
}

impl<K: 'static, V: 'static> StructuralHandle for MapChangeHandle<K, V> {
    type Change = MapChange<K, V>;

    fn deliver(&self, change: &MapChange<K, V>) {
        self.on_changed(change)
    }
}

impl<N: 'static> StructuralHandle for ArrayChangeHandle<N> {
    type Change = ArrayChange<N>;

    fn deliver(&self, change: &ArrayChange<N>) {
        self.on_changed(change)
    }
}

// =============================================================================
// SOURCE FORWARDING
// =============================================================================

/// Receiver of a source collection's changes.
pub trait ForwardTarget<Ch> {
    fn source_changed(self: Rc<Self>, change: &Ch);
}

/// Structural listener that forwards to a target it does not keep alive.
///
/// Once the target is dropped the forwarder reports itself collected and the
/// source collection prunes it.
pub struct SourceForwarder<Ch> {
    target: Weak<dyn ForwardTarget<Ch>>,
}

impl<Ch> SourceForwarder<Ch> {
    /// Forwarder to `target`.
    pub fn new(target: Weak<dyn ForwardTarget<Ch>>) -> Self {
        Self { target }
    }

    fn forward(&self, change: &Ch) {
        if let Some(target) = self.target.upgrade() {
            target.source_changed(change);
        }
    }

    fn is_collected(&self) -> bool {
        self.target.strong_count() == 0
    }
}

impl<E> ListChangeListener<E> for SourceForwarder<ListChange<E>> {
    fn on_changed(&self, change: &ListChange<E>) {
        self.forward(change)
    }

    fn was_garbage_collected(&self) -> bool {
        self.is_collected()
    }
}

impl<E> SetChangeListener<E> for SourceForwarder<SetChange<E>> {
    fn on_changed(&self, change: &SetChange<E>) {
        self.forward(change)
    }

    fn was_garbage_collected(&self) -> bool {
        self.is_collected()
    }
}

impl<K, V> MapChangeListener<K, V> for SourceForwarder<MapChange<K, V>> {
    fn on_changed(&self, change: &MapChange<K, V>) {
        self.forward(change)
    }

    fn was_garbage_collected(&self) -> bool {
        self.is_collected()
    }
}
