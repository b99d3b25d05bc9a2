// ============================================================================
// spark-observables - CollectionProperty
// A property holding an observable list, set or map
// ============================================================================
//
// The property listens to the collection it currently holds through a
// forwarder that references the property weakly: dropping the property
// leaves a collected forwarder behind, which the collection prunes the next
// time it fires.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::collections::{CollectionOptions, ObservableList, ObservableMap, ObservableSet};
use crate::core::sink::ErrorSink;
use crate::core::types::{ChangeHandle, InvalidationHandle, Observable, ObservableValue};
use crate::helpers::{CollectionPropertyHelper, Diffable, ForwardTarget, SourceForwarder};
use crate::registry::Strategy;

/// Property holding an observable list.
pub type ListProperty<E> = CollectionProperty<ObservableList<E>>;

/// Property holding an observable set.
pub type SetProperty<E> = CollectionProperty<ObservableSet<E>>;

/// Property holding an observable map.
pub type MapProperty<K, V> = CollectionProperty<ObservableMap<K, V>>;

struct CollectionPropertyInner<C: Diffable> {
    value: RefCell<Option<C>>,
    helper: CollectionPropertyHelper<C>,
    forwarder: C::Handle,
    error_sink: ErrorSink,
}

impl<C: Diffable> Observable for CollectionPropertyInner<C> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.helper.remove_invalidation_listener(listener);
    }
}

impl<C: Diffable> ObservableValue<Option<C>> for CollectionPropertyInner<C> {
    fn value(&self) -> Option<C> {
        self.value.borrow().clone()
    }

    fn add_change_listener(&self, listener: ChangeHandle<Option<C>>) {
        self.helper.add_change_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeHandle<Option<C>>) {
        self.helper.remove_change_listener(listener);
    }
}

impl<C: Diffable> ForwardTarget<C::Change> for CollectionPropertyInner<C> {
    fn source_changed(self: Rc<Self>, change: &C::Change) {
        self.helper.fire_source_changed(&*self, change, &self.error_sink);
    }
}

/// A property whose value is an observable collection, or nothing.
///
/// Listeners hear about both replacing the collection and editing the one
/// currently held. Structural listeners get a diff either way: replacing a
/// list reports one edit removing the old contents and adding the new.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ListProperty, ObservableList, list_listener};
///
/// let prop = ListProperty::new(Some(ObservableList::from_vec(vec!['a', 'b', 'c'])));
/// let edits = Rc::new(RefCell::new(Vec::new()));
/// prop.add_listener(list_listener({
///     let edits = edits.clone();
///     move |change| {
///         for edit in change.edits() {
///             edits.borrow_mut().push((edit.from(), edit.removed_size(), edit.added_size()));
///         }
///     }
/// }));
///
/// prop.set(Some(ObservableList::from_vec(vec!['x', 'y'])));
/// assert_eq!(*edits.borrow(), vec![(0, 3, 2)]);
/// ```
pub struct CollectionProperty<C: Diffable> {
    inner: Rc<CollectionPropertyInner<C>>,
}

impl<C: Diffable> Clone for CollectionProperty<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Diffable> CollectionProperty<C> {
    /// Property holding `value`.
    pub fn new(value: Option<C>) -> Self {
        Self::with_options(value, CollectionOptions::default())
    }

    /// Property holding `value`, reporting listener failures to `options.error_sink`.
    pub fn with_options(value: Option<C>, options: CollectionOptions) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<CollectionPropertyInner<C>>| {
            let target: Weak<dyn ForwardTarget<C::Change>> = weak.clone();
            CollectionPropertyInner {
                value: RefCell::new(value.clone()),
                helper: CollectionPropertyHelper::new(value.clone()),
                forwarder: C::forwarding_listener(SourceForwarder::new(target)),
                error_sink: options.error_sink,
            }
        });
        if let Some(collection) = &value {
            collection.add_structural_listener(inner.forwarder.clone());
        }
        Self { inner }
    }

    /// The collection currently held (shared, not copied).
    pub fn get(&self) -> Option<C> {
        self.inner.value.borrow().clone()
    }

    /// Hold `value` instead of the current collection.
    ///
    /// Setting the instance already held does nothing.
    pub fn set(&self, value: Option<C>) {
        let old = self.inner.value.replace(value.clone());
        let unchanged = match (&old, &value) {
            (Some(a), Some(b)) => a.same_instance(b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(old) = &old {
            old.remove_structural_listener(&self.inner.forwarder);
        }
        if let Some(new) = &value {
            new.add_structural_listener(self.inner.forwarder.clone());
        }
        self.fire_value_changed();
    }

    /// Notify listeners as if the value had been written.
    pub fn fire_value_changed(&self) {
        self.inner.helper.fire_value_changed(&*self.inner, &self.inner.error_sink);
    }

    /// Register a structural listener. It hears about edits of the held collection and about replacements.
    pub fn add_listener(&self, listener: C::Handle) {
        self.inner.helper.add_structural_listener(listener);
    }

    /// Unregister a structural listener.
    pub fn remove_listener(&self, listener: &C::Handle) {
        self.inner.helper.remove_structural_listener(listener);
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Current registry representation.
    pub fn listener_strategy(&self) -> Strategy {
        self.inner.helper.strategy()
    }

    /// Registered invalidation listeners.
    pub fn invalidation_listeners(&self) -> Vec<InvalidationHandle> {
        self.inner.helper.invalidation_listeners()
    }

    /// Registered change listeners.
    pub fn change_listeners(&self) -> Vec<ChangeHandle<Option<C>>> {
        self.inner.helper.change_listeners()
    }

    /// Registered structural listeners.
    pub fn listeners(&self) -> Vec<C::Handle> {
        self.inner.helper.structural_listeners()
    }
}

impl<C: Diffable> Observable for CollectionProperty<C> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.remove_invalidation_listener(listener);
    }
}

impl<C: Diffable> ObservableValue<Option<C>> for CollectionProperty<C> {
    fn value(&self) -> Option<C> {
        self.get()
    }

    fn add_change_listener(&self, listener: ChangeHandle<Option<C>>) {
        self.inner.add_change_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeHandle<Option<C>>) {
        self.inner.remove_change_listener(listener);
    }
}

impl<C: Diffable + fmt::Debug> fmt::Debug for CollectionProperty<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionProperty")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
