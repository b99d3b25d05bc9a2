// ============================================================================
// spark-observables - ObservableList
// A Vec that reports every mutation as ordered range edits
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use super::CollectionOptions;
use crate::changes::{ListChange, ListEdit};
use crate::core::sink::ErrorSink;
use crate::core::types::{InvalidationHandle, ListChangeHandle, Observable};
use crate::helpers::{CollectionHelper, Diffable, SourceForwarder};

struct ListInner<E> {
    items: RefCell<Rc<Vec<E>>>,
    helper: CollectionHelper<ListChangeHandle<E>>,
    error_sink: ErrorSink,
}

/// An observable list.
///
/// Clones share the same list. Index arguments follow `Vec`: out of range
/// positions panic.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ObservableList, list_listener};
///
/// let list = ObservableList::from_vec(vec!['a', 'b', 'c']);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// list.add_listener(list_listener({
///     let seen = seen.clone();
///     move |change| {
///         for edit in change.edits() {
///             seen.borrow_mut().push((edit.from(), edit.removed_size(), edit.added_size()));
///         }
///     }
/// }));
///
/// list.splice(1..3, ['x']);
/// assert_eq!(list.to_vec(), vec!['a', 'x']);
/// assert_eq!(*seen.borrow(), vec![(1, 2, 1)]);
/// ```
pub struct ObservableList<E> {
    inner: Rc<ListInner<E>>,
}

impl<E> Clone for ObservableList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Clone + 'static> ObservableList<E> {
    /// Empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// List holding `items`.
    pub fn from_vec(items: Vec<E>) -> Self {
        Self::with_options(items, CollectionOptions::default())
    }

    /// List holding `items`, reporting listener failures to `options.error_sink`.
    pub fn with_options(items: Vec<E>, options: CollectionOptions) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(Rc::new(items)),
                helper: CollectionHelper::new(),
                error_sink: options.error_sink,
            }),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Clone of the element at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<E> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Copy of the contents.
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().as_ref().clone()
    }

    /// The current contents, shared. Later mutations do not affect it.
    pub fn snapshot(&self) -> Rc<Vec<E>> {
        Rc::clone(&self.inner.items.borrow())
    }

    /// Borrow the contents for the duration of `f`.
    ///
    /// `f` must not mutate this list.
    pub fn with<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    fn edit<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> R {
        let mut items = self.inner.items.borrow_mut();
        f(Rc::make_mut(&mut items))
    }

    /// Append `value`.
    pub fn push(&self, value: E) {
        let index = self.edit(|items| {
            items.push(value.clone());
            items.len() - 1
        });
        self.fire(|| vec![ListEdit::new(index, Vec::new(), vec![value])]);
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: E) {
        self.edit(|items| items.insert(index, value.clone()));
        self.fire(|| vec![ListEdit::new(index, Vec::new(), vec![value])]);
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&self, index: usize) -> E {
        let removed = self.edit(|items| items.remove(index));
        self.fire(|| vec![ListEdit::new(index, vec![removed.clone()], Vec::new())]);
        removed
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&self, index: usize, value: E) -> E {
        let old = self.edit(|items| std::mem::replace(&mut items[index], value.clone()));
        self.fire(|| vec![ListEdit::new(index, vec![old.clone()], vec![value])]);
        old
    }

    /// Replace `range` with `replacement`, returning the removed elements.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn splice(&self, range: Range<usize>, replacement: impl IntoIterator<Item = E>) -> Vec<E> {
        let added: Vec<E> = replacement.into_iter().collect();
        let from = range.start;
        let removed: Vec<E> = self.edit(|items| items.splice(range, added.iter().cloned()).collect());
        if !removed.is_empty() || !added.is_empty() {
            self.fire(|| vec![ListEdit::new(from, removed.clone(), added)]);
        }
        removed
    }

    /// Replace the whole contents.
    pub fn set_all(&self, items: impl IntoIterator<Item = E>) {
        let added: Vec<E> = items.into_iter().collect();
        let removed = self.edit(|items| std::mem::replace(items, added.clone()));
        if !removed.is_empty() || !added.is_empty() {
            self.fire(|| vec![ListEdit::new(0, removed, added)]);
        }
    }

    /// Remove every element.
    pub fn clear(&self) {
        let removed = self.edit(std::mem::take);
        if !removed.is_empty() {
            self.fire(|| vec![ListEdit::new(0, removed, Vec::new())]);
        }
    }

    /// Keep only the elements for which `keep` returns true.
    ///
    /// Each run of removed elements becomes one edit.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) {
        let current = self.snapshot();
        let mut kept = Vec::with_capacity(current.len());
        let mut edits = Vec::new();
        let mut run = Vec::new();
        for item in current.iter() {
            if keep(item) {
                if !run.is_empty() {
                    edits.push(ListEdit::new(kept.len(), std::mem::take(&mut run), Vec::new()));
                }
                kept.push(item.clone());
            } else {
                run.push(item.clone());
            }
        }
        if !run.is_empty() {
            edits.push(ListEdit::new(kept.len(), run, Vec::new()));
        }
        if edits.is_empty() {
            return;
        }

        drop(current);
        *self.inner.items.borrow_mut() = Rc::new(kept);
        self.fire(|| edits);
    }

    fn fire(&self, edits: impl FnOnce() -> Vec<ListEdit<E>>) {
        let list = self.snapshot();
        self.inner.helper.fire(self, &self.inner.error_sink, |emit| {
            emit(&ListChange::new(list, edits()))
        });
    }

    // =========================================================================
    // LISTENERS
    // =========================================================================

    /// Register a listener for list edits.
    pub fn add_listener(&self, listener: ListChangeHandle<E>) {
        self.inner.helper.add_listener(listener);
    }

    /// Unregister a list listener.
    pub fn remove_listener(&self, listener: &ListChangeHandle<E>) {
        self.inner.helper.remove_listener(listener);
    }

    /// Registered list listeners.
    pub fn listeners(&self) -> Vec<ListChangeHandle<E>> {
        self.inner.helper.listeners()
    }

    /// Registered invalidation listeners.
    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        self.inner.helper.invalidation_listeners()
    }
}

impl<E: Clone + 'static> Observable for ObservableList<E> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.helper.remove_invalidation_listener(listener);
    }
}

impl<E: Clone + 'static> Default for ObservableList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + 'static> FromIterator<E> for ObservableList<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<E: Clone + fmt::Debug + 'static> fmt::Debug for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}

// =============================================================================
// AS A PROPERTY VALUE
// =============================================================================

impl<E: Clone + 'static> Diffable for ObservableList<E> {
    type Change = ListChange<E>;
    type Handle = ListChangeHandle<E>;

    fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn add_structural_listener(&self, listener: ListChangeHandle<E>) {
        self.add_listener(listener);
    }

    fn remove_structural_listener(&self, listener: &ListChangeHandle<E>) {
        self.remove_listener(listener);
    }

    fn forwarding_listener(forwarder: SourceForwarder<ListChange<E>>) -> ListChangeHandle<E> {
        Rc::new(forwarder)
    }

    /// One edit replacing everything: removed = old contents, added = new.
    fn synthesize(old: Option<&Self>, new: Option<&Self>, emit: &mut dyn FnMut(&ListChange<E>)) {
        let removed = old.map(Self::to_vec).unwrap_or_default();
        let list = new.map_or_else(|| Rc::new(Vec::new()), Self::snapshot);
        if removed.is_empty() && list.is_empty() {
            return;
        }
        let added = list.as_ref().clone();
        emit(&ListChange::single(list, ListEdit::new(0, removed, added)));
    }

    fn adapt(change: &ListChange<E>, current: &Self) -> ListChange<E> {
        change.rebased(current.snapshot())
    }
}

// =============================================================================
// TESTS
// =============================================================================
