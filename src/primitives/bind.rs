// ============================================================================
// spark-observables - Bidirectional Binding
// Keeps two properties holding the same value
// ============================================================================
//
// A binding is one change listener registered on both properties. When
// either side changes it writes the new value to the other, with an
// `updating` flag so the echo from that write is ignored.
//
// The binding holds both properties weakly. Once either is dropped it
// reports itself collected and the survivor prunes it.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::core::error::{BindingError, ListenerError};
use crate::core::sink::ErrorSink;
use crate::core::types::{ChangeHandle, ChangeListener, ListenerKey, ObservableValue};
use crate::primitives::property::{SimpleProperty, WeakProperty};

/// Two properties kept in sync.
///
/// Bindings compare equal by their unordered pair of properties, so
/// `unbind_bidirectional(b, a)` removes the binding made by
/// `bind_bidirectional(a, b)`.
pub struct BidirectionalBinding<T> {
    left: WeakProperty<T>,
    right: WeakProperty<T>,
    key: ListenerKey,
    updating: Cell<bool>,
    error_sink: ErrorSink,
}

/// Clears the updating flag when the write is done, even on panic.
struct Updating<'a>(&'a Cell<bool>);

impl<'a> Updating<'a> {
    fn start(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Updating<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Clone + 'static> BidirectionalBinding<T> {
    fn new(left: &SimpleProperty<T>, right: &SimpleProperty<T>) -> Self {
        Self {
            left: left.downgrade(),
            right: right.downgrade(),
            key: binding_key(left, right),
            updating: Cell::new(false),
            error_sink: left.error_sink().clone(),
        }
    }

    /// Both properties, if both are still alive.
    pub fn properties(&self) -> Option<(SimpleProperty<T>, SimpleProperty<T>)> {
        Some((self.left.upgrade()?, self.right.upgrade()?))
    }

    /// Whether both properties are still alive.
    pub fn is_bound(&self) -> bool {
        self.left.is_alive() && self.right.is_alive()
    }

    fn detach(&self, a: &SimpleProperty<T>, b: &SimpleProperty<T>) {
        let probe = probe::<T>(self.key);
        a.remove_change_listener(&probe);
        b.remove_change_listener(&probe);
    }
}

impl<T: Clone + 'static> ChangeListener<T> for BidirectionalBinding<T> {
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T) {
        if self.updating.get() {
            return;
        }
        let Some((left, right)) = self.properties() else {
            return;
        };

        let from_left = observable as *const _ as *const () == left.as_ptr();
        let (source, target) = if from_left { (left, right) } else { (right, left) };

        let _updating = Updating::start(&self.updating);
        let Err(cause) = target.set(new.clone()) else {
            return;
        };

        let error = match source.set(old.clone()) {
            Ok(_) => {
                tracing::debug!(%cause, "bidirectional update rejected, source restored");
                BindingError::UpdateFailed { cause }
            }
            Err(rollback) => {
                tracing::debug!(%cause, %rollback, "bidirectional rollback failed, unbinding");
                self.detach(&source, &target);
                BindingError::RollbackFailed { cause, rollback }
            }
        };
        self.error_sink.report(&ListenerError::Binding(error));
    }

    fn was_garbage_collected(&self) -> bool {
        !self.is_bound()
    }

    fn listener_key(&self) -> Option<ListenerKey> {
        Some(self.key)
    }
}

fn binding_key<T: Clone + 'static>(a: &SimpleProperty<T>, b: &SimpleProperty<T>) -> ListenerKey {
    ListenerKey::unordered(a.as_ptr(), b.as_ptr())
}

/// Stand-in equal to the binding with `key`, used to unregister it.
struct KeyProbe {
    key: ListenerKey,
}

impl<T> ChangeListener<T> for KeyProbe {
    fn changed(&self, _: &dyn ObservableValue<T>, _: &T, _: &T) {}

    fn listener_key(&self) -> Option<ListenerKey> {
        Some(self.key)
    }
}

fn probe<T: 'static>(key: ListenerKey) -> ChangeHandle<T> {
    Rc::new(KeyProbe { key })
}

/// Keep `a` and `b` in sync.
///
/// `a` first takes `b`'s value. Binding the same pair again is a no-op for
/// the listener registries. When a later write to one side is rejected by
/// the other, the source is restored and the failure goes to `a`'s error
/// sink.
///
/// # Example
///
/// ```
/// use spark_observables::{SimpleProperty, bind_bidirectional, unbind_bidirectional};
///
/// let a = SimpleProperty::new(1);
/// let b = SimpleProperty::new(2);
/// bind_bidirectional(&a, &b).unwrap();
/// assert_eq!(a.get(), 2);
///
/// a.set(5).unwrap();
/// assert_eq!(b.get(), 5);
///
/// unbind_bidirectional(&b, &a).unwrap();
/// a.set(6).unwrap();
/// assert_eq!(b.get(), 5);
/// ```
pub fn bind_bidirectional<T: Clone + 'static>(
    a: &SimpleProperty<T>,
    b: &SimpleProperty<T>,
) -> Result<Rc<BidirectionalBinding<T>>, BindingError> {
    if a.ptr_eq(b) {
        return Err(BindingError::SelfBinding);
    }
    a.set(b.get()).map_err(BindingError::InitialSync)?;

    let binding = Rc::new(BidirectionalBinding::new(a, b));
    let handle: ChangeHandle<T> = binding.clone();
    a.add_change_listener(handle.clone());
    b.add_change_listener(handle);
    Ok(binding)
}

/// Remove the binding between `a` and `b`, in either order.
pub fn unbind_bidirectional<T: Clone + 'static>(
    a: &SimpleProperty<T>,
    b: &SimpleProperty<T>,
) -> Result<(), BindingError> {
    if a.ptr_eq(b) {
        return Err(BindingError::SelfBinding);
    }
    let probe = probe::<T>(binding_key(a, b));
    a.remove_change_listener(&probe);
    b.remove_change_listener(&probe);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
