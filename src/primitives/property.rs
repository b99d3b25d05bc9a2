// ============================================================================
// spark-observables - SimpleProperty
// A writable scalar property with invalidation and change listeners
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::error::{BindingError, PropertyError};
use crate::core::sink::ErrorSink;
use crate::core::types::{
    ChangeHandle, EqualsFn, InvalidationHandle, Observable, ObservableValue, WritableValue,
    default_equals,
};
use crate::helpers::ValueHelper;
use crate::primitives::bind::{BidirectionalBinding, bind_bidirectional, unbind_bidirectional};
use crate::registry::Strategy;

/// Check run before a value is stored.
pub type Validator<T> = Rc<dyn Fn(&T) -> Result<(), PropertyError>>;

/// Options for creating a property.
pub struct PropertyOptions<T> {
    /// Custom equality; writes of an equal value are ignored.
    pub equals: Option<EqualsFn<T>>,
    /// Rejects values before they are stored.
    pub validator: Option<Validator<T>>,
    /// Where failing listeners are reported.
    pub error_sink: Option<ErrorSink>,
}

impl<T> Default for PropertyOptions<T> {
    fn default() -> Self {
        Self {
            equals: None,
            validator: None,
            error_sink: None,
        }
    }
}

// =============================================================================
// INNER
// =============================================================================

/// Shared state of a property. Listeners receive this as the observable, so
/// its address identifies the property.
pub(crate) struct PropertyInner<T> {
    value: RefCell<T>,
    helper: ValueHelper<T>,
    equals: EqualsFn<T>,
    validator: Option<Validator<T>>,
    error_sink: ErrorSink,
}

impl<T: Clone + 'static> PropertyInner<T> {
    fn fire(&self) {
        self.helper.fire_value_changed(self, &self.error_sink);
    }
}

impl<T: Clone + 'static> Observable for PropertyInner<T> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.helper.remove_invalidation_listener(listener);
    }
}

impl<T: Clone + 'static> ObservableValue<T> for PropertyInner<T> {
    fn value(&self) -> T {
        self.value.borrow().clone()
    }

    fn add_change_listener(&self, listener: ChangeHandle<T>) {
        self.helper.add_change_listener(self, listener);
    }

    fn remove_change_listener(&self, listener: &ChangeHandle<T>) {
        self.helper.remove_change_listener(listener);
    }
}

/// A property reference that does not keep the property alive.
pub(crate) struct WeakProperty<T> {
    inner: Weak<PropertyInner<T>>,
}

impl<T> WeakProperty<T> {
    pub(crate) fn upgrade(&self) -> Option<SimpleProperty<T>> {
        self.inner.upgrade().map(|inner| SimpleProperty { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

// =============================================================================
// SIMPLE PROPERTY
// =============================================================================

/// A writable observable value.
///
/// Clones share the same property. Writing a value equal to the current one
/// (per the configured equality) does nothing. In-place edits made through
/// [`update`](Self::update) notify like any other write.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ObservableValue, SimpleProperty, change_listener};
///
/// let name = SimpleProperty::new(String::from("a"));
/// let log = Rc::new(RefCell::new(Vec::new()));
/// name.add_change_listener(change_listener({
///     let log = log.clone();
///     move |_, old: &String, new: &String| log.borrow_mut().push(format!("{old}->{new}"))
/// }));
///
/// name.set(String::from("b")).unwrap();
/// name.set(String::from("b")).unwrap();
/// assert_eq!(*log.borrow(), vec!["a->b"]);
/// ```
pub struct SimpleProperty<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for SimpleProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> SimpleProperty<T> {
    /// Property holding `value`, compared with `PartialEq`.
    pub fn new(value: T) -> Self {
        Self::with_options(value, PropertyOptions::default())
    }

    /// Property holding `value`, configured by `options`.
    pub fn with_options(value: T, options: PropertyOptions<T>) -> Self {
        let equals = options.equals.unwrap_or(default_equals::<T>);
        Self {
            inner: Rc::new(PropertyInner {
                value: RefCell::new(value),
                helper: ValueHelper::new(equals),
                equals,
                validator: options.validator,
                error_sink: options.error_sink.unwrap_or_default(),
            }),
        }
    }
}

impl<T: Clone + 'static> SimpleProperty<T> {
    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value for the duration of `f`.
    ///
    /// `f` must not write this property: `set` or `update` from inside `f`
    /// panics because the value is still borrowed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value`. Returns whether it differed from the current value.
    pub fn set(&self, value: T) -> Result<bool, PropertyError> {
        if let Some(validator) = &self.inner.validator {
            validator(&value)?;
        }
        {
            let mut current = self.inner.value.borrow_mut();
            if (self.inner.equals)(&current, &value) {
                return Ok(false);
            }
            *current = value;
        }
        self.inner.fire();
        Ok(true)
    }

    /// Edit a copy of the value and store it.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<bool, PropertyError> {
        let mut value = self.get();
        f(&mut value);
        self.set(value)
    }

    /// Notify listeners as if the value had been written.
    ///
    /// Change listeners only hear about it if the value differs from the one
    /// they saw last.
    pub fn fire_value_changed(&self) {
        self.inner.fire();
    }

    /// Where failing listeners of this property are reported.
    pub fn error_sink(&self) -> &ErrorSink {
        &self.inner.error_sink
    }

    /// Keep `self` and `other` in sync, see [`bind_bidirectional`].
    pub fn bind_bidirectional(&self, other: &Self) -> Result<Rc<BidirectionalBinding<T>>, BindingError> {
        bind_bidirectional(self, other)
    }

    /// Remove the binding with `other`, see [`unbind_bidirectional`].
    pub fn unbind_bidirectional(&self, other: &Self) -> Result<(), BindingError> {
        unbind_bidirectional(self, other)
    }

    /// Whether both handles refer to the same property.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.inner) as *const ()
    }

    pub(crate) fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            inner: Rc::downgrade(&self.inner),
        }
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
    pub fn change_listeners(&self) -> Vec<ChangeHandle<T>> {
        self.inner.helper.change_listeners()
    }
}

impl<T: Clone + 'static> Observable for SimpleProperty<T> {
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.remove_invalidation_listener(listener);
    }
}

impl<T: Clone + 'static> ObservableValue<T> for SimpleProperty<T> {
    fn value(&self) -> T {
        self.get()
    }

    fn add_change_listener(&self, listener: ChangeHandle<T>) {
        self.inner.add_change_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeHandle<T>) {
        self.inner.remove_change_listener(listener);
    }
}

impl<T: Clone + 'static> WritableValue<T> for SimpleProperty<T> {
    fn set_value(&self, value: T) -> Result<(), PropertyError> {
        self.set(value).map(|_| ())
    }
}

impl<T: fmt::Debug> fmt::Debug for SimpleProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SimpleProperty")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
