// ============================================================================
// spark-observables - Listener Registry
// The per-observable listener store and its promotion/demotion rules
// ============================================================================
//
// A registry holds three independent listener categories: invalidation,
// whole-value change and structural change. Most observables have zero, one
// or two listeners, so the registry is an enum that only allocates a buffer
// once a second listener shows up:
//
//   Empty ──add──▶ Single-<kind> ──add other──▶ Generic
//     ▲               │    ▲                        │
//     └────remove─────┘    └──remove leaves one─────┘
//
// Transitions consume the registry and return the new one. Kinds that lack
// one of the categories plug in `NoListener`, which has no values.
// =============================================================================

pub mod dispatch;
pub mod slots;
pub mod weak;

use std::fmt;
use std::rc::Rc;

use crate::core::types::{
    ArrayChangeListener, ChangeListener, InvalidationHandle, InvalidationListener,
    ListChangeListener, MapChangeListener, SetChangeListener,
};

pub use dispatch::Snapshot;
pub use slots::{ListenerSlots, SlotSnapshot};
pub use weak::{WeakListener, prune_collected};

// =============================================================================
// LISTENER ENTRY
// =============================================================================

/// What the registry needs from a stored listener handle.
pub trait ListenerEntry: Clone {
    /// Same allocation, or equal listener keys.
    fn same_listener(&self, other: &Self) -> bool;

    fn was_garbage_collected(&self) -> bool;
}

macro_rules! listener_entry {
    ([$($g:ident),*] $listener:ty) => {
        impl<$($g: 'static),*> ListenerEntry for Rc<$listener> {
            fn same_listener(&self, other: &Self) -> bool {
                let this = Rc::as_ptr(self) as *const ();
                let that = Rc::as_ptr(other) as *const ();
                if this == that {
                    return true;
                }
                matches!(
                    (self.listener_key(), other.listener_key()),
                    (Some(a), Some(b)) if a == b
                )
            }

            fn was_garbage_collected(&self) -> bool {
                (**self).was_garbage_collected()
            }
        }
    };
}

listener_entry!([] dyn InvalidationListener);
listener_entry!([T] dyn ChangeListener<T>);
listener_entry!([E] dyn ListChangeListener<E>);
listener_entry!([E] dyn SetChangeListener<E>);
listener_entry!([K, V] dyn MapChangeListener<K, V>);
listener_entry!([N] dyn ArrayChangeListener<N>);

/// Placeholder for a listener category an observable kind does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoListener {}

impl ListenerEntry for NoListener {
    fn same_listener(&self, _other: &Self) -> bool {
        match *self {}
    }

    fn was_garbage_collected(&self) -> bool {
        match *self {}
    }
}

// =============================================================================
// ANY LISTENER / STRATEGY
// =============================================================================

/// A listener tagged with the category it is registered under.
pub enum AnyListener<C, S> {
    Invalidation(InvalidationHandle),
    Change(C),
    Structural(S),
}

impl<C: ListenerEntry, S: ListenerEntry> AnyListener<C, S> {
    fn same_listener(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Invalidation(a), Self::Invalidation(b)) => a.same_listener(b),
            (Self::Change(a), Self::Change(b)) => a.same_listener(b),
            (Self::Structural(a), Self::Structural(b)) => a.same_listener(b),
            _ => false,
        }
    }

    fn was_garbage_collected(&self) -> bool {
        match self {
            Self::Invalidation(l) => l.was_garbage_collected(),
            Self::Change(l) => l.was_garbage_collected(),
            Self::Structural(l) => l.was_garbage_collected(),
        }
    }
}

impl<C: Clone, S: Clone> Clone for AnyListener<C, S> {
    fn clone(&self) -> Self {
        match self {
            Self::Invalidation(l) => Self::Invalidation(l.clone()),
            Self::Change(l) => Self::Change(l.clone()),
            Self::Structural(l) => Self::Structural(l.clone()),
        }
    }
}

/// Which representation a registry currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Empty,
    SingleInvalidation,
    SingleChange,
    SingleStructural,
    Generic,
}

// =============================================================================
// GENERIC LISTENERS
// =============================================================================

/// N listeners of any category. A category with no listeners has no buffer.
pub struct GenericListeners<C, S> {
    invalidation: Option<ListenerSlots<InvalidationHandle>>,
    change: Option<ListenerSlots<C>>,
    structural: Option<ListenerSlots<S>>,
}

fn push_into<L: ListenerEntry>(slots: &mut Option<ListenerSlots<L>>, listener: L) {
    match slots {
        Some(slots) => slots.push(listener),
        None => *slots = Some(ListenerSlots::from_listeners(vec![listener])),
    }
}

fn remove_from<L: ListenerEntry>(slots: &mut Option<ListenerSlots<L>>, listener: &L) {
    if let Some(buffer) = slots {
        if buffer.remove(listener) && buffer.is_empty() {
            *slots = None;
        }
    }
}

fn prune_in<L: ListenerEntry>(slots: &mut Option<ListenerSlots<L>>) {
    if let Some(buffer) = slots {
        buffer.prune();
        if buffer.is_empty() {
            *slots = None;
        }
    }
}

fn slots_len<L: ListenerEntry>(slots: &Option<ListenerSlots<L>>) -> usize {
    slots.as_ref().map_or(0, ListenerSlots::len)
}

impl<C: ListenerEntry, S: ListenerEntry> GenericListeners<C, S> {
    fn from_pair(first: AnyListener<C, S>, second: AnyListener<C, S>) -> Self {
        let mut generic = Self {
            invalidation: None,
            change: None,
            structural: None,
        };
        // Two listeners of the same kind share one buffer of capacity two.
        match (first, second) {
            (AnyListener::Invalidation(a), AnyListener::Invalidation(b)) => {
                generic.invalidation = Some(ListenerSlots::from_listeners(vec![a, b]));
            }
            (AnyListener::Change(a), AnyListener::Change(b)) => {
                generic.change = Some(ListenerSlots::from_listeners(vec![a, b]));
            }
            (AnyListener::Structural(a), AnyListener::Structural(b)) => {
                generic.structural = Some(ListenerSlots::from_listeners(vec![a, b]));
            }
            (first, second) => {
                generic.push(first);
                generic.push(second);
            }
        }
        generic
    }

    fn push(&mut self, listener: AnyListener<C, S>) {
        match listener {
            AnyListener::Invalidation(l) => push_into(&mut self.invalidation, l),
            AnyListener::Change(l) => push_into(&mut self.change, l),
            AnyListener::Structural(l) => push_into(&mut self.structural, l),
        }
    }

    fn remove(&mut self, listener: &AnyListener<C, S>) {
        match listener {
            AnyListener::Invalidation(l) => remove_from(&mut self.invalidation, l),
            AnyListener::Change(l) => remove_from(&mut self.change, l),
            AnyListener::Structural(l) => remove_from(&mut self.structural, l),
        }
    }

    fn prune(&mut self) {
        prune_in(&mut self.invalidation);
        prune_in(&mut self.change);
        prune_in(&mut self.structural);
    }

    fn len(&self) -> usize {
        slots_len(&self.invalidation) + slots_len(&self.change) + slots_len(&self.structural)
    }

    /// The only listener, when exactly one is left.
    fn into_single(self) -> Option<AnyListener<C, S>> {
        if self.len() != 1 {
            return None;
        }
        if let Some(l) = self.invalidation.and_then(ListenerSlots::into_single) {
            return Some(AnyListener::Invalidation(l));
        }
        if let Some(l) = self.change.and_then(ListenerSlots::into_single) {
            return Some(AnyListener::Change(l));
        }
        self.structural
            .and_then(ListenerSlots::into_single)
            .map(AnyListener::Structural)
    }
}

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

/// Listener storage for one observable.
///
/// # Example
///
/// ```
/// use spark_observables::registry::{AnyListener, ListenerRegistry, NoListener, Strategy};
/// use spark_observables::{ChangeHandle, invalidation_listener};
///
/// let a = invalidation_listener(|_| {});
/// let b = invalidation_listener(|_| {});
///
/// let registry: ListenerRegistry<ChangeHandle<i32>, NoListener> = ListenerRegistry::default();
/// let registry = registry.add(AnyListener::Invalidation(a.clone()));
/// assert_eq!(registry.strategy(), Strategy::SingleInvalidation);
///
/// let registry = registry.add(AnyListener::Invalidation(b));
/// assert_eq!(registry.strategy(), Strategy::Generic);
///
/// let registry = registry.remove(&AnyListener::Invalidation(a));
/// assert_eq!(registry.strategy(), Strategy::SingleInvalidation);
/// ```
pub enum ListenerRegistry<C, S> {
    Empty,
    SingleInvalidation(InvalidationHandle),
    SingleChange(C),
    SingleStructural(S),
    Generic(Box<GenericListeners<C, S>>),
}

impl<C, S> Default for ListenerRegistry<C, S> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<C: ListenerEntry, S: ListenerEntry> ListenerRegistry<C, S> {
    fn single(listener: AnyListener<C, S>) -> Self {
        match listener {
            AnyListener::Invalidation(l) => Self::SingleInvalidation(l),
            AnyListener::Change(l) => Self::SingleChange(l),
            AnyListener::Structural(l) => Self::SingleStructural(l),
        }
    }

    /// The most specific representation for `generic`'s population.
    fn normalized(generic: Box<GenericListeners<C, S>>) -> Self {
        match generic.len() {
            0 => Self::Empty,
            1 => generic.into_single().map_or(Self::Empty, Self::single),
            _ => Self::Generic(generic),
        }
    }

    fn promote(existing: AnyListener<C, S>, added: AnyListener<C, S>) -> Self {
        if existing.same_listener(&added) {
            return Self::single(existing);
        }
        Self::Generic(Box::new(GenericListeners::from_pair(existing, added)))
    }

    fn keep_unless(existing: AnyListener<C, S>, removed: &AnyListener<C, S>) -> Self {
        if existing.same_listener(removed) {
            Self::Empty
        } else {
            Self::single(existing)
        }
    }

    /// Register a listener, returning the new registry.
    pub fn add(self, listener: AnyListener<C, S>) -> Self {
        match self {
            Self::Empty => Self::single(listener),
            Self::SingleInvalidation(l) => Self::promote(AnyListener::Invalidation(l), listener),
            Self::SingleChange(l) => Self::promote(AnyListener::Change(l), listener),
            Self::SingleStructural(l) => Self::promote(AnyListener::Structural(l), listener),
            Self::Generic(mut generic) => {
                generic.push(listener);
                // Pushing may have pruned collected listeners.
                Self::normalized(generic)
            }
        }
    }

    /// Unregister a listener, returning the new registry. Unknown listeners
    /// leave the registry unchanged.
    pub fn remove(self, listener: &AnyListener<C, S>) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::SingleInvalidation(l) => Self::keep_unless(AnyListener::Invalidation(l), listener),
            Self::SingleChange(l) => Self::keep_unless(AnyListener::Change(l), listener),
            Self::SingleStructural(l) => Self::keep_unless(AnyListener::Structural(l), listener),
            Self::Generic(mut generic) => {
                generic.remove(listener);
                Self::normalized(generic)
            }
        }
    }

    /// Drop every listener whose target has been collected.
    pub fn prune_collected(self) -> Self {
        match self {
            Self::Generic(mut generic) => {
                generic.prune();
                Self::normalized(generic)
            }
            Self::Empty => Self::Empty,
            single => match single.single_listener() {
                Some(l) if l.was_garbage_collected() => Self::Empty,
                _ => single,
            },
        }
    }

    fn single_listener(&self) -> Option<AnyListener<C, S>> {
        match self {
            Self::SingleInvalidation(l) => Some(AnyListener::Invalidation(l.clone())),
            Self::SingleChange(l) => Some(AnyListener::Change(l.clone())),
            Self::SingleStructural(l) => Some(AnyListener::Structural(l.clone())),
            Self::Empty | Self::Generic(_) => None,
        }
    }

    // =========================================================================
    // CONVENIENCE
    // =========================================================================

    /// Register an invalidation listener.
    pub fn add_invalidation(self, listener: InvalidationHandle) -> Self {
        self.add(AnyListener::Invalidation(listener))
    }

    /// Unregister an invalidation listener.
    pub fn remove_invalidation(self, listener: &InvalidationHandle) -> Self {
        self.remove(&AnyListener::Invalidation(listener.clone()))
    }

    /// Register a whole-value change listener.
    pub fn add_change(self, listener: C) -> Self {
        self.add(AnyListener::Change(listener))
    }

    /// Unregister a whole-value change listener.
    pub fn remove_change(self, listener: &C) -> Self {
        self.remove(&AnyListener::Change(listener.clone()))
    }

    /// Register a structural listener.
    pub fn add_structural(self, listener: S) -> Self {
        self.add(AnyListener::Structural(listener))
    }

    /// Unregister a structural listener.
    pub fn remove_structural(self, listener: &S) -> Self {
        self.remove(&AnyListener::Structural(listener.clone()))
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Which representation is in use.
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Empty => Strategy::Empty,
            Self::SingleInvalidation(_) => Strategy::SingleInvalidation,
            Self::SingleChange(_) => Strategy::SingleChange,
            Self::SingleStructural(_) => Strategy::SingleStructural,
            Self::Generic(_) => Strategy::Generic,
        }
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::SingleInvalidation(_) | Self::SingleChange(_) | Self::SingleStructural(_) => 1,
            Self::Generic(generic) => generic.len(),
        }
    }

    /// Copy of the registered invalidation listeners, in order.
    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        match self {
            Self::SingleInvalidation(l) => vec![l.clone()],
            Self::Generic(generic) => collect(&generic.invalidation),
            _ => Vec::new(),
        }
    }

    /// Copy of the registered change listeners, in order.
    pub fn change_listeners(&self) -> Vec<C> {
        match self {
            Self::SingleChange(l) => vec![l.clone()],
            Self::Generic(generic) => collect(&generic.change),
            _ => Vec::new(),
        }
    }

    /// Copy of the registered structural listeners, in order.
    pub fn structural_listeners(&self) -> Vec<S> {
        match self {
            Self::SingleStructural(l) => vec![l.clone()],
            Self::Generic(generic) => collect(&generic.structural),
            _ => Vec::new(),
        }
    }

    /// Whether at least one change listener is registered.
    pub fn has_change_listeners(&self) -> bool {
        match self {
            Self::SingleChange(_) => true,
            Self::Generic(generic) => generic.change.is_some(),
            _ => false,
        }
    }

    /// Whether at least one structural listener is registered.
    pub fn has_structural_listeners(&self) -> bool {
        match self {
            Self::SingleStructural(_) => true,
            Self::Generic(generic) => generic.structural.is_some(),
            _ => false,
        }
    }

    /// Capture the current listeners for a dispatch.
    ///
    /// Generic buffers are shared with the snapshot, not copied, so any
    /// registration made while the snapshot is alive copies the buffer first.
    pub fn snapshot(&self) -> Snapshot<C, S> {
        match self {
            Self::Empty => Snapshot::empty(),
            Self::SingleInvalidation(l) => Snapshot::single(AnyListener::Invalidation(l.clone())),
            Self::SingleChange(l) => Snapshot::single(AnyListener::Change(l.clone())),
            Self::SingleStructural(l) => Snapshot::single(AnyListener::Structural(l.clone())),
            Self::Generic(generic) => Snapshot::generic(
                generic.invalidation.as_ref().map(ListenerSlots::snapshot),
                generic.change.as_ref().map(ListenerSlots::snapshot),
                generic.structural.as_ref().map(ListenerSlots::snapshot),
            ),
        }
    }
}

fn collect<L: ListenerEntry>(slots: &Option<ListenerSlots<L>>) -> Vec<L> {
    slots
        .as_ref()
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default()
}

impl<C, S> fmt::Debug for ListenerRegistry<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Empty => "Empty",
            Self::SingleInvalidation(_) => "SingleInvalidation",
            Self::SingleChange(_) => "SingleChange",
            Self::SingleStructural(_) => "SingleStructural",
            Self::Generic(_) => "Generic",
        };
        f.debug_tuple("ListenerRegistry").field(&variant).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ChangeHandle, ListChangeHandle, change_listener, invalidation_listener, list_listener};

    type Registry = ListenerRegistry<ChangeHandle<i32>, ListChangeHandle<i32>>;

    fn inv() -> InvalidationHandle {
        invalidation_listener(|_| {})
    }

    fn chg() -> ChangeHandle<i32> {
        change_listener(|_, _, _| {})
    }

    fn lst() -> ListChangeHandle<i32> {
        list_listener(|_| {})
    }

    #[test]
    fn empty_to_single_of_each_kind() {
        assert_eq!(Registry::default().add_invalidation(inv()).strategy(), Strategy::SingleInvalidation);
        assert_eq!(Registry::default().add_change(chg()).strategy(), Strategy::SingleChange);
        assert_eq!(Registry::default().add_structural(lst()).strategy(), Strategy::SingleStructural);
    }

    #[test]
    fn adding_same_single_is_noop() {
        let l = inv();
        let registry = Registry::default().add_invalidation(l.clone()).add_invalidation(l);
        assert_eq!(registry.strategy(), Strategy::SingleInvalidation);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_kind_promotes_to_generic() {
        let registry = Registry::default().add_invalidation(inv()).add_change(chg());
        assert_eq!(registry.strategy(), Strategy::Generic);
        assert_eq!(registry.invalidation_listeners().len(), 1);
        assert_eq!(registry.change_listeners().len(), 1);
    }

    #[test]
    fn single_remove_of_other_is_noop() {
        let l = chg();
        let registry = Registry::default().add_change(l.clone()).remove_change(&chg());
        assert_eq!(registry.strategy(), Strategy::SingleChange);

        let registry = registry.remove_change(&l);
        assert_eq!(registry.strategy(), Strategy::Empty);
    }

    #[test]
    fn generic_demotes_when_one_left() {
        let a = inv();
        let b = lst();
        let registry = Registry::default().add_invalidation(a.clone()).add_structural(b.clone());
        let registry = registry.remove_invalidation(&a);
        assert_eq!(registry.strategy(), Strategy::SingleStructural);
        assert!(registry.structural_listeners()[0].same_listener(&b));
    }

    #[test]
    fn generic_clears_emptied_category() {
        let a = inv();
        let registry = Registry::default()
            .add_invalidation(a.clone())
            .add_change(chg())
            .add_change(chg());
        let registry = registry.remove_invalidation(&a);
        assert_eq!(registry.strategy(), Strategy::Generic);
        assert!(registry.invalidation_listeners().is_empty());
        assert_eq!(registry.change_listeners().len(), 2);
    }

    #[test]
    fn many_additions_survive_growth() {
        let all: Vec<_> = (0..60).map(|_| inv()).collect();
        let registry = all
            .iter()
            .cloned()
            .fold(Registry::default(), |r, l| r.add_invalidation(l));

        let current = registry.invalidation_listeners();
        assert_eq!(current.len(), 60);
        assert!(current.iter().zip(&all).all(|(a, b)| a.same_listener(b)));
    }

    #[test]
    fn prune_collected_demotes() {
        let kept = inv();
        let target = inv();
        let weak = WeakListener::invalidation(&target);
        let registry = Registry::default().add_invalidation(kept.clone()).add_invalidation(weak);
        drop(target);

        let registry = registry.prune_collected();
        assert_eq!(registry.strategy(), Strategy::SingleInvalidation);
        assert!(registry.invalidation_listeners()[0].same_listener(&kept));
    }

    #[test]
    fn prune_collected_single_empties() {
        let target = inv();
        let registry = Registry::default().add_invalidation(WeakListener::invalidation(&target));
        drop(target);
        assert!(registry.prune_collected().is_empty());
    }

    #[test]
    fn no_listener_registry_works_for_sources() {
        let registry: ListenerRegistry<NoListener, ListChangeHandle<u8>> = ListenerRegistry::default();
        let registry = registry.add_structural(list_listener(|_| {})).add_invalidation(inv());
        assert_eq!(registry.len(), 2);
        assert!(!registry.has_change_listeners());
    }
}
