// ============================================================================
// spark-observables - Type Definitions
// Observable traits, listener traits and listener handles
// ============================================================================

use std::rc::Rc;

use crate::changes::{ArrayChange, ListChange, MapChange, SetChange};
use crate::core::error::PropertyError;

// =============================================================================
// OBSERVABLES
// =============================================================================
//
// Every observable accepts invalidation listeners. Value-holding observables
// additionally accept whole-value change listeners. Collection observables
// accept structural listeners through their own inherent methods, since the
// listener type depends on the collection kind.
// =============================================================================

/// Something that can become stale and tell listeners about it.
pub trait Observable {
    /// Register an invalidation listener. Registering the same listener twice
    /// is a no-op.
    fn add_invalidation_listener(&self, listener: InvalidationHandle);

    /// Unregister an invalidation listener. Unknown listeners are ignored.
    fn remove_invalidation_listener(&self, listener: &InvalidationHandle);
}

/// An observable that holds a current value of type `T`.
pub trait ObservableValue<T>: Observable {
    /// Get the current value (cloning).
    fn value(&self) -> T;

    /// Register a change listener.
    fn add_change_listener(&self, listener: ChangeHandle<T>);

    /// Unregister a change listener.
    fn remove_change_listener(&self, listener: &ChangeHandle<T>);
}

/// An observable value that can also be written.
pub trait WritableValue<T>: ObservableValue<T> {
    /// Replace the current value. Fails if the value is rejected.
    fn set_value(&self, value: T) -> Result<(), PropertyError>;
}

/// Equality function type for comparing values
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Default equality using PartialEq
pub fn default_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// LISTENER KEY
// =============================================================================

/// Value identity for listeners that are equal without being the same object.
///
/// Two registered listeners are considered the same when they share an
/// allocation, or when both report the same key. A bidirectional binding
/// reports the unordered pair of its participants, so `bind(a, b)` and
/// `bind(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    low: usize,
    high: usize,
}

impl ListenerKey {
    /// Key for an unordered pair of addresses.
    pub fn unordered(a: *const (), b: *const ()) -> Self {
        let (a, b) = (a as usize, b as usize);
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }
}

// =============================================================================
// LISTENER TRAITS
// =============================================================================

/// Receives "the value became stale" notifications.
pub trait InvalidationListener {
    fn invalidated(&self, observable: &dyn Observable);

    /// True once the object backing this listener is gone. Collected
    /// listeners are skipped on delivery and pruned from registries.
    fn was_garbage_collected(&self) -> bool {
        false
    }

    /// Value identity, see [`ListenerKey`].
    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

/// Receives old and new whole values.
pub trait ChangeListener<T> {
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T);

    fn was_garbage_collected(&self) -> bool {
        false
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

/// Receives structural edits of a list.
pub trait ListChangeListener<E> {
    fn on_changed(&self, change: &ListChange<E>);

    fn was_garbage_collected(&self) -> bool {
        false
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

/// Receives one added or removed element of a set per call.
pub trait SetChangeListener<E> {
    fn on_changed(&self, change: &SetChange<E>);

    fn was_garbage_collected(&self) -> bool {
        false
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

/// Receives one added, removed or updated entry of a map per call.
pub trait MapChangeListener<K, V> {
    fn on_changed(&self, change: &MapChange<K, V>);

    fn was_garbage_collected(&self) -> bool {
        false
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

/// Receives range updates of a typed array.
pub trait ArrayChangeListener<N> {
    fn on_changed(&self, change: &ArrayChange<N>);

    fn was_garbage_collected(&self) -> bool {
        false
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        None
    }
}

// Closures are listeners.

impl<F: Fn(&dyn Observable)> InvalidationListener for F {
    fn invalidated(&self, observable: &dyn Observable) {
        self(observable)
    }
}

impl<T, F: Fn(&dyn ObservableValue<T>, &T, &T)> ChangeListener<T> for F {
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T) {
        self(observable, old, new)
    }
}

impl<E, F: Fn(&ListChange<E>)> ListChangeListener<E> for F {
    fn on_changed(&self, change: &ListChange<E>) {
        self(change)
    }
}

impl<E, F: Fn(&SetChange<E>)> SetChangeListener<E> for F {
    fn on_changed(&self, change: &SetChange<E>) {
        self(change)
    }
}

impl<K, V, F: Fn(&MapChange<K, V>)> MapChangeListener<K, V> for F {
    fn on_changed(&self, change: &MapChange<K, V>) {
        self(change)
    }
}

impl<N, F: Fn(&ArrayChange<N>)> ArrayChangeListener<N> for F {
    fn on_changed(&self, change: &ArrayChange<N>) {
        self(change)
    }
}

// =============================================================================
// HANDLES
// =============================================================================

/// Shared invalidation listener
pub type InvalidationHandle = Rc<dyn InvalidationListener>;

/// Shared change listener
pub type ChangeHandle<T> = Rc<dyn ChangeListener<T>>;

/// Shared list change listener
pub type ListChangeHandle<E> = Rc<dyn ListChangeListener<E>>;

/// Shared set change listener
pub type SetChangeHandle<E> = Rc<dyn SetChangeListener<E>>;

/// Shared map change listener
pub type MapChangeHandle<K, V> = Rc<dyn MapChangeListener<K, V>>;

/// Shared array change listener
pub type ArrayChangeHandle<N> = Rc<dyn ArrayChangeListener<N>>;

/// Wrap a closure as an invalidation listener handle.
///
/// # Example
///
/// ```
/// use spark_observables::{invalidation_listener, Observable, SimpleProperty};
///
/// let prop = SimpleProperty::new(1);
/// prop.add_invalidation_listener(invalidation_listener(|_| println!("stale")));
/// ```
pub fn invalidation_listener(f: impl Fn(&dyn Observable) + 'static) -> InvalidationHandle {
    Rc::new(f)
}

/// Wrap a closure as a change listener handle.
pub fn change_listener<T: 'static>(
    f: impl Fn(&dyn ObservableValue<T>, &T, &T) + 'static,
) -> ChangeHandle<T> {
    Rc::new(f)
}

/// Wrap a closure as a list change listener handle.
pub fn list_listener<E: 'static>(f: impl Fn(&ListChange<E>) + 'static) -> ListChangeHandle<E> {
    Rc::new(f)
}

/// Wrap a closure as a set change listener handle.
pub fn set_listener<E: 'static>(f: impl Fn(&SetChange<E>) + 'static) -> SetChangeHandle<E> {
    Rc::new(f)
}

/// Wrap a closure as a map change listener handle.
pub fn map_listener<K: 'static, V: 'static>(
    f: impl Fn(&MapChange<K, V>) + 'static,
) -> MapChangeHandle<K, V> {
    Rc::new(f)
}

/// Wrap a closure as an array change listener handle.
pub fn array_listener<N: 'static>(
    f: impl Fn(&ArrayChange<N>) + 'static,
) -> ArrayChangeHandle<N> {
    Rc::new(f)
}

// =============================================================================
// TESTS
// =============================================================================
