// ============================================================================
// spark-observables - Listener Registries for Observable Values
// ============================================================================
//
// Observable properties, collections and typed arrays backed by a compact
// listener registry: no allocation for zero or one listener, safe listener
// changes while a notification is running, and weak listeners that are
// pruned once their target is gone.
// ============================================================================

pub mod changes;
pub mod collections;
pub mod core;
pub mod helpers;
pub mod primitives;
pub mod registry;

// Re-export core items at crate root for ergonomic access
pub use core::error::{BindingError, ListenerError, ListenerKind, PropertyError};
pub use core::sink::ErrorSink;
pub use core::types::{
    ArrayChangeHandle, ArrayChangeListener, ChangeHandle, ChangeListener, EqualsFn,
    InvalidationHandle, InvalidationListener, ListChangeHandle, ListChangeListener, ListenerKey,
    MapChangeHandle, MapChangeListener, Observable, ObservableValue, SetChangeHandle,
    SetChangeListener, WritableValue, array_listener, change_listener, default_equals,
    invalidation_listener, list_listener, map_listener, set_listener,
};

// Change records
pub use changes::{ArrayChange, ListChange, ListEdit, MapChange, SetChange};

// Collections
pub use collections::{
    CollectionOptions, ObservableArray, ObservableFloatArray, ObservableIntegerArray,
    ObservableList, ObservableMap, ObservableSet, OrderedMap, OrderedSet,
};

// Properties and bindings
pub use primitives::{
    BidirectionalBinding, CollectionProperty, ConstantValue, ListProperty, MapProperty,
    PropertyOptions, SetProperty, SimpleProperty, Validator, bind_bidirectional,
    unbind_bidirectional,
};

// Registry
pub use registry::{Strategy, WeakListener};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counting(count: &Rc<Cell<u32>>) -> InvalidationHandle {
        let count = count.clone();
        invalidation_listener(move |_| count.set(count.get() + 1))
    }

    #[test]
    fn property_strategy_follows_population() {
        let prop = SimpleProperty::new(0);
        assert_eq!(prop.listener_strategy(), Strategy::Empty);

        let a = invalidation_listener(|_| {});
        let b = change_listener(|_, _: &i32, _: &i32| {});
        prop.add_invalidation_listener(a.clone());
        assert_eq!(prop.listener_strategy(), Strategy::SingleInvalidation);

        prop.add_change_listener(b.clone());
        assert_eq!(prop.listener_strategy(), Strategy::Generic);

        prop.remove_invalidation_listener(&a);
        assert_eq!(prop.listener_strategy(), Strategy::SingleChange);

        prop.remove_change_listener(&b);
        assert_eq!(prop.listener_strategy(), Strategy::Empty);
    }

    #[test]
    fn invalidation_runs_before_change() {
        let prop = SimpleProperty::new(1);
        let order = Rc::new(RefCell::new(Vec::new()));
        prop.add_change_listener(change_listener({
            let order = order.clone();
            move |_, _: &i32, _: &i32| order.borrow_mut().push("change")
        }));
        prop.add_invalidation_listener(invalidation_listener({
            let order = order.clone();
            move |_| order.borrow_mut().push("invalidation")
        }));

        prop.set(2).unwrap();
        assert_eq!(*order.borrow(), vec!["invalidation", "change"]);
    }

    #[test]
    fn panicking_listener_goes_to_the_sink() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let prop = SimpleProperty::with_options(
            0,
            PropertyOptions {
                error_sink: Some(ErrorSink::new({
                    let errors = errors.clone();
                    move |err| errors.borrow_mut().push(err.to_string())
                })),
                ..Default::default()
            },
        );
        let count = Rc::new(Cell::new(0));
        prop.add_change_listener(change_listener(|_, _: &i32, _: &i32| panic!("boom")));
        prop.add_invalidation_listener(counting(&count));

        prop.set(1).unwrap();
        prop.set(2).unwrap();

        assert_eq!(count.get(), 2);
        assert_eq!(*errors.borrow(), vec!["change listener panicked: boom"; 2]);
    }

    #[test]
    fn structural_panics_are_guarded_too() {
        let list = ObservableList::with_options(
            Vec::new(),
            CollectionOptions {
                error_sink: ErrorSink::ignore(),
            },
        );
        let seen = Rc::new(Cell::new(0));
        list.add_listener(list_listener(|_: &ListChange<i32>| panic!("first")));
        list.add_listener(list_listener({
            let seen = seen.clone();
            move |_: &ListChange<i32>| seen.set(seen.get() + 1)
        }));

        list.push(1);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn weak_listener_through_the_public_api() {
        let prop = SimpleProperty::new(0);
        let count = Rc::new(Cell::new(0));
        let target = counting(&count);
        prop.add_invalidation_listener(WeakListener::invalidation(&target));

        prop.set(1).unwrap();
        assert_eq!(count.get(), 1);

        drop(target);
        prop.set(2).unwrap();
        assert_eq!(count.get(), 1);
        assert!(prop.invalidation_listeners().is_empty());
    }
}
