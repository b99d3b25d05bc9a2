// ============================================================================
// spark-observables - ObservableArray
// Typed arrays of plain numbers that report written ranges
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::CollectionOptions;
use crate::changes::ArrayChange;
use crate::core::sink::ErrorSink;
use crate::core::types::{ArrayChangeHandle, InvalidationHandle, Observable};
use crate::helpers::CollectionHelper;

struct ArrayInner<N> {
    items: RefCell<Rc<Vec<N>>>,
    helper: CollectionHelper<ArrayChangeHandle<N>>,
    error_sink: ErrorSink,
}

/// An observable array of `Copy` numbers.
///
/// Every write fires, even when it stores the values already there.
/// Listeners receive an [`ArrayChange`] describing the written range; the
/// array has no per-element records, so a listener reads the new values
/// from [`ArrayChange::array`].
pub struct ObservableArray<N> {
    inner: Rc<ArrayInner<N>>,
}

/// Observable array of `i32`.
pub type ObservableIntegerArray = ObservableArray<i32>;

/// Observable array of `f32`.
pub type ObservableFloatArray = ObservableArray<f32>;

impl<N> Clone for ObservableArray<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: Copy + Default + 'static> ObservableArray<N> {
    /// Empty array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Array holding `items`.
    pub fn from_vec(items: Vec<N>) -> Self {
        Self::with_options(items, CollectionOptions::default())
    }

    /// Array holding `items`, reporting listener failures to `options.error_sink`.
    pub fn with_options(items: Vec<N>, options: CollectionOptions) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
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

    /// Element at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<N> {
        self.inner.items.borrow().get(index).copied()
    }

    /// Copy of the contents.
    pub fn to_vec(&self) -> Vec<N> {
        self.inner.items.borrow().as_ref().clone()
    }

    /// The current contents, shared. Later writes do not affect it.
    pub fn snapshot(&self) -> Rc<Vec<N>> {
        Rc::clone(&self.inner.items.borrow())
    }

    fn edit<R>(&self, f: impl FnOnce(&mut Vec<N>) -> R) -> R {
        let mut items = self.inner.items.borrow_mut();
        f(Rc::make_mut(&mut items))
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&self, index: usize, value: N) {
        self.edit(|items| items[index] = value);
        self.fire(false, index, index + 1);
    }

    /// Overwrite from `start` with `values`, growing the array if needed.
    ///
    /// # Panics
    ///
    /// Panics if `start > len`.
    pub fn set_range(&self, start: usize, values: &[N]) {
        let len = self.len();
        assert!(start <= len, "set_range start {start} is past the end (len {len})");
        if values.is_empty() {
            return;
        }
        let grew = self.edit(|items| {
            let old_len = items.len();
            let end = start + values.len();
            if end > old_len {
                items.resize(end, N::default());
            }
            items[start..end].copy_from_slice(values);
            end > old_len
        });
        self.fire(grew, start, start + values.len());
    }

    /// Replace the whole contents.
    pub fn set_all(&self, values: &[N]) {
        let old_len = self.edit(|items| {
            let old_len = items.len();
            items.clear();
            items.extend_from_slice(values);
            old_len
        });
        if old_len == 0 && values.is_empty() {
            return;
        }
        self.fire(old_len != values.len(), 0, values.len());
    }

    /// Append `values`.
    pub fn add_all(&self, values: &[N]) {
        if values.is_empty() {
            return;
        }
        let from = self.edit(|items| {
            let from = items.len();
            items.extend_from_slice(values);
            from
        });
        self.fire(true, from, from + values.len());
    }

    /// Change the length, filling new slots with `N::default()`.
    ///
    /// The reported range covers the new slots; it is empty when shrinking.
    pub fn resize(&self, len: usize) {
        let old_len = self.edit(|items| {
            let old_len = items.len();
            items.resize(len, N::default());
            old_len
        });
        if old_len != len {
            self.fire(true, old_len.min(len), len);
        }
    }

    /// Truncate to length zero.
    pub fn clear(&self) {
        self.resize(0);
    }

    fn fire(&self, size_changed: bool, from: usize, to: usize) {
        let array = self.snapshot();
        self.inner.helper.fire(self, &self.inner.error_sink, |emit| {
            emit(&ArrayChange::new(array, size_changed, from, to))
        });
    }

    /// Register a listener for range writes.
    pub fn add_listener(&self, listener: ArrayChangeHandle<N>) {
        self.inner.helper.add_listener(listener);
    }

    /// Unregister a range listener.
    pub fn remove_listener(&self, listener: &ArrayChangeHandle<N>) {
        self.inner.helper.remove_listener(listener);
    }

    /// Registered range listeners.
    pub fn listeners(&self) -> Vec<ArrayChangeHandle<N>> {
        self.inner.helper.listeners()
    }
}

impl<N: Copy + Default + 'static> Observable for ObservableArray<N> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.helper.remove_invalidation_listener(listener);
    }
}

impl<N: Copy + Default + 'static> Default for ObservableArray<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: fmt::Debug> fmt::Debug for ObservableArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
