use spark_observables::{
    BindingError, ErrorSink, ListenerError, PropertyError, PropertyOptions, SimpleProperty,
    Validator, bind_bidirectional, unbind_bidirectional,
};
use std::cell::RefCell;
use std::rc::Rc;

fn collecting_sink() -> (ErrorSink, Rc<RefCell<Vec<ListenerError>>>) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = ErrorSink::new({
        let errors = errors.clone();
        move |err| errors.borrow_mut().push(err.clone())
    });
    (sink, errors)
}

fn non_negative() -> Validator<i32> {
    Rc::new(|v: &i32| {
        if *v < 0 {
            Err(PropertyError::rejected("negative"))
        } else {
            Ok(())
        }
    })
}

#[test]
fn unbinding_in_reverse_order_removes_both_registrations() {
    let a = SimpleProperty::new(1);
    let b = SimpleProperty::new(2);
    bind_bidirectional(&a, &b).unwrap();
    assert_eq!(a.change_listeners().len(), 1);
    assert_eq!(b.change_listeners().len(), 1);

    unbind_bidirectional(&b, &a).unwrap();
    assert!(a.change_listeners().is_empty());
    assert!(b.change_listeners().is_empty());

    b.set(7).unwrap();
    assert_eq!(a.get(), 2);
}

#[test]
fn rejected_update_restores_the_source() {
    let (sink, errors) = collecting_sink();
    let a = SimpleProperty::with_options(
        0,
        PropertyOptions {
            error_sink: Some(sink),
            ..Default::default()
        },
    );
    let b = SimpleProperty::with_options(
        0,
        PropertyOptions {
            validator: Some(non_negative()),
            ..Default::default()
        },
    );
    bind_bidirectional(&a, &b).unwrap();

    assert_eq!(a.set(-1), Ok(true));
    assert_eq!(a.get(), 0);
    assert_eq!(b.get(), 0);
    assert_eq!(
        *errors.borrow(),
        vec![ListenerError::Binding(BindingError::UpdateFailed {
            cause: PropertyError::rejected("negative"),
        })]
    );

    // Still bound after a recovered failure.
    a.set(4).unwrap();
    assert_eq!(b.get(), 4);
}

#[test]
fn chained_bindings_propagate_through_the_middle() {
    let a = SimpleProperty::new(0);
    let b = SimpleProperty::new(0);
    let c = SimpleProperty::new(0);
    bind_bidirectional(&a, &b).unwrap();
    bind_bidirectional(&b, &c).unwrap();

    a.set(1).unwrap();
    assert_eq!((a.get(), b.get(), c.get()), (1, 1, 1));

    c.set(2).unwrap();
    assert_eq!((a.get(), b.get(), c.get()), (2, 2, 2));

    assert_eq!(b.change_listeners().len(), 2);
}

#[test]
fn binding_handle_reports_its_properties() {
    let a = SimpleProperty::new("x".to_string());
    let b = SimpleProperty::new("y".to_string());
    let binding = a.bind_bidirectional(&b).unwrap();
    assert_eq!(a.get(), "y");

    let (left, right) = binding.properties().unwrap();
    assert!(left.ptr_eq(&a));
    assert!(right.ptr_eq(&b));

    drop((left, right));
    drop(b);
    assert!(!binding.is_bound());
    assert!(binding.properties().is_none());
}

#[test]
fn self_binding_is_rejected_both_ways() {
    let a = SimpleProperty::new(1);
    let alias = a.clone();
    assert_eq!(bind_bidirectional(&a, &alias).err(), Some(BindingError::SelfBinding));
    assert_eq!(unbind_bidirectional(&a, &alias), Err(BindingError::SelfBinding));
}
