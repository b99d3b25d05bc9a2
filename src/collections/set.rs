// ============================================================================
// spark-observables - ObservableSet
// An insertion-ordered set that reports one change per element
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use super::{CollectionOptions, OrderedSet};
use crate::changes::SetChange;
use crate::core::sink::ErrorSink;
use crate::core::types::{InvalidationHandle, Observable, SetChangeHandle};
use crate::helpers::{CollectionHelper, Diffable, SourceForwarder};

/// Emit removals then additions, reusing one record for all of them.
fn emit_each<E: Clone>(
    set: Rc<OrderedSet<E>>,
    removed: Vec<E>,
    added: Vec<E>,
    emit: &mut dyn FnMut(&SetChange<E>),
) {
    let mut change: Option<SetChange<E>> = None;
    let removed = removed.into_iter().map(|e| (e, false));
    let added = added.into_iter().map(|e| (e, true));
    for (element, was_added) in removed.chain(added) {
        if let Some(change) = change.as_mut() {
            change.reset(element, was_added);
        } else if was_added {
            change = Some(SetChange::added(Rc::clone(&set), element));
        } else {
            change = Some(SetChange::removed(Rc::clone(&set), element));
        }
        if let Some(change) = &change {
            emit(change);
        }
    }
}

/// Elements of `a` that are not in `b`, in `a`'s order.
fn difference<E: Eq + Hash + Clone>(a: &OrderedSet<E>, b: &OrderedSet<E>) -> Vec<E> {
    a.iter().filter(|e| !b.contains(*e)).cloned().collect()
}

struct SetInner<E> {
    items: RefCell<Rc<OrderedSet<E>>>,
    helper: CollectionHelper<SetChangeHandle<E>>,
    error_sink: ErrorSink,
}

/// An observable set that iterates in insertion order.
///
/// Clones share the same set. A mutation touching several elements fires
/// once, with one [`SetChange`] per element: removals first, then additions.
pub struct ObservableSet<E> {
    inner: Rc<SetInner<E>>,
}

impl<E> Clone for ObservableSet<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Eq + Hash + Clone + 'static> ObservableSet<E> {
    /// Empty set.
    pub fn new() -> Self {
        Self::with_options(OrderedSet::new(), CollectionOptions::default())
    }

    /// Set holding `items`, reporting listener failures to `options.error_sink`.
    pub fn with_options(items: OrderedSet<E>, options: CollectionOptions) -> Self {
        Self {
            inner: Rc::new(SetInner {
                items: RefCell::new(Rc::new(items)),
                helper: CollectionHelper::new(),
                error_sink: options.error_sink,
            }),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Whether `element` is present.
    pub fn contains(&self, element: &E) -> bool {
        self.inner.items.borrow().contains(element)
    }

    /// Elements in insertion order.
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().iter().cloned().collect()
    }

    /// The current contents, shared. Later mutations do not affect it.
    pub fn snapshot(&self) -> Rc<OrderedSet<E>> {
        Rc::clone(&self.inner.items.borrow())
    }

    fn edit<R>(&self, f: impl FnOnce(&mut OrderedSet<E>) -> R) -> R {
        let mut items = self.inner.items.borrow_mut();
        f(Rc::make_mut(&mut items))
    }

    /// Returns true if the element was not present.
    pub fn insert(&self, element: E) -> bool {
        let inserted = self.edit(|items| items.insert(element.clone()));
        if inserted {
            self.fire(Vec::new(), vec![element]);
        }
        inserted
    }

    /// Returns true if the element was present.
    pub fn remove(&self, element: &E) -> bool {
        let removed = self.edit(|items| items.remove(element));
        if removed {
            self.fire(vec![element.clone()], Vec::new());
        }
        removed
    }

    /// Remove every element, one change per element.
    pub fn clear(&self) {
        let old = self.edit(std::mem::take);
        if !old.is_empty() {
            self.fire(old.iter().cloned().collect(), Vec::new());
        }
    }

    /// Replace the contents with `elements`.
    pub fn set_all(&self, elements: impl IntoIterator<Item = E>) {
        let new: OrderedSet<E> = elements.into_iter().collect();
        let old = self.snapshot();
        let removed = difference(&old, &new);
        let added = difference(&new, &old);
        drop(old);
        *self.inner.items.borrow_mut() = Rc::new(new);
        self.fire(removed, added);
    }

    /// Keep only the elements for which `keep` returns true.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) {
        let current = self.snapshot();
        let removed: Vec<E> = current.iter().filter(|e| !keep(*e)).cloned().collect();
        drop(current);
        if removed.is_empty() {
            return;
        }
        self.edit(|items| {
            for element in &removed {
                items.remove(element);
            }
        });
        self.fire(removed, Vec::new());
    }

    fn fire(&self, removed: Vec<E>, added: Vec<E>) {
        if removed.is_empty() && added.is_empty() {
            return;
        }
        let set = self.snapshot();
        self.inner.helper.fire(self, &self.inner.error_sink, |emit| {
            emit_each(set, removed, added, emit)
        });
    }

    /// Register a listener for per-element changes.
    pub fn add_listener(&self, listener: SetChangeHandle<E>) {
        self.inner.helper.add_listener(listener);
    }

    /// Unregister a set listener.
    pub fn remove_listener(&self, listener: &SetChangeHandle<E>) {
        self.inner.helper.remove_listener(listener);
    }

    /// Registered set listeners.
    pub fn listeners(&self) -> Vec<SetChangeHandle<E>> {
        self.inner.helper.listeners()
    }
}

impl<E: Eq + Hash + Clone + 'static> Observable for ObservableSet<E> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.helper.remove_invalidation_listener(listener);
    }
}

impl<E: Eq + Hash + Clone + 'static> Default for ObservableSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Eq + Hash + Clone + 'static> FromIterator<E> for ObservableSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::with_options(iter.into_iter().collect(), CollectionOptions::default())
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.inner.items.borrow(), f)
    }
}

impl<E: Eq + Hash + Clone + 'static> Diffable for ObservableSet<E> {
    type Change = SetChange<E>;
    type Handle = SetChangeHandle<E>;

    fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn add_structural_listener(&self, listener: SetChangeHandle<E>) {
        self.add_listener(listener);
    }

    fn remove_structural_listener(&self, listener: &SetChangeHandle<E>) {
        self.remove_listener(listener);
    }

    fn forwarding_listener(forwarder: SourceForwarder<SetChange<E>>) -> SetChangeHandle<E> {
        Rc::new(forwarder)
    }

    fn synthesize(old: Option<&Self>, new: Option<&Self>, emit: &mut dyn FnMut(&SetChange<E>)) {
        let old = old.map_or_else(|| Rc::new(OrderedSet::new()), Self::snapshot);
        let new = new.map_or_else(|| Rc::new(OrderedSet::new()), Self::snapshot);
        let removed = difference(&old, &new);
        let added = difference(&new, &old);
        emit_each(new, removed, added, emit);
    }

    fn adapt(change: &SetChange<E>, current: &Self) -> SetChange<E> {
        change.rebased(current.snapshot())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::set_listener;

    fn recorder(set: &ObservableSet<&'static str>) -> Rc<RefCell<Vec<(bool, &'static str)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        set.add_listener(set_listener({
            let log = log.clone();
            move |change: &SetChange<&'static str>| {
                log.borrow_mut().push((change.was_added(), *change.element()))
            }
        }));
        log
    }

    #[test]
    fn insert_and_remove_fire_once_each() {
        let set = ObservableSet::new();
        let log = recorder(&set);

        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert!(set.remove(&"a"));
        assert!(!set.remove(&"a"));

        assert_eq!(*log.borrow(), vec![(true, "a"), (false, "a")]);
    }

    #[test]
    fn set_all_reports_removals_then_additions() {
        let set: ObservableSet<_> = ["a", "b", "c"].into_iter().collect();
        let log = recorder(&set);

        set.set_all(["c", "d"]);

        assert_eq!(set.to_vec(), vec!["c", "d"]);
        assert_eq!(*log.borrow(), vec![(false, "a"), (false, "b"), (true, "d")]);
    }

    #[test]
    fn clear_and_retain() {
        let set: ObservableSet<_> = ["a", "b", "c"].into_iter().collect();
        let log = recorder(&set);

        set.retain(|e| *e != "b");
        set.clear();

        assert!(set.is_empty());
        assert_eq!(*log.borrow(), vec![(false, "b"), (false, "a"), (false, "c")]);
    }
}
