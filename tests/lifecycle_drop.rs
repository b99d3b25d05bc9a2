use spark_observables::{
    ListChange, ListChangeHandle, ListProperty, Observable, ObservableList, ObservableValue,
    SimpleProperty, Strategy, WeakListener, change_listener, invalidation_listener, list_listener,
};
use spark_observables::registry::ListenerEntry;
use std::cell::Cell;
use std::rc::Rc;

fn collected(prop: &SimpleProperty<i32>) -> usize {
    prop.invalidation_listeners()
        .iter()
        .filter(|l| l.was_garbage_collected())
        .count()
}

#[test]
fn collected_listener_is_pruned_when_the_buffer_fills() {
    let prop = SimpleProperty::new(0);
    prop.add_invalidation_listener(invalidation_listener(|_| {}));
    prop.add_invalidation_listener(invalidation_listener(|_| {}));

    let target = invalidation_listener(|_| {});
    prop.add_invalidation_listener(WeakListener::invalidation(&target));
    drop(target);
    assert_eq!(collected(&prop), 1);

    // Room left in the buffer: no pruning yet.
    prop.add_invalidation_listener(invalidation_listener(|_| {}));
    assert_eq!(prop.invalidation_listeners().len(), 4);
    assert_eq!(collected(&prop), 1);

    // Full: the dead entry makes room instead of growing.
    prop.add_invalidation_listener(invalidation_listener(|_| {}));
    assert_eq!(prop.invalidation_listeners().len(), 4);
    assert_eq!(collected(&prop), 0);
}

#[test]
fn collected_change_listener_is_pruned_after_notification() {
    let hits = Rc::new(Cell::new(0));
    let prop = SimpleProperty::new(0);

    {
        let target = change_listener({
            let hits = hits.clone();
            move |_, _: &i32, _: &i32| hits.set(hits.get() + 1)
        });
        prop.add_change_listener(WeakListener::change(&target));

        prop.set(1).unwrap();
        assert_eq!(hits.get(), 1);
        // target drops here
    }

    assert_eq!(prop.listener_strategy(), Strategy::SingleChange);
    prop.set(2).unwrap();
    assert_eq!(hits.get(), 1, "dropped target must not be called");
    assert_eq!(prop.listener_strategy(), Strategy::Empty);
}

#[test]
fn weak_structural_listener_stops_with_its_target() {
    let hits = Rc::new(Cell::new(0));
    let list = ObservableList::from_vec(vec![1, 2]);
    let target: ListChangeHandle<i32> = list_listener({
        let hits = hits.clone();
        move |_| hits.set(hits.get() + 1)
    });
    let strong = list_listener(|_: &ListChange<i32>| {});
    list.add_listener(Rc::new(WeakListener::new(&target)));
    list.add_listener(strong.clone());

    list.push(3);
    assert_eq!(hits.get(), 1);

    drop(target);
    list.push(4);
    assert_eq!(hits.get(), 1);
    assert_eq!(list.listeners().len(), 1);
    assert!(list.listeners()[0].same_listener(&strong));
}

#[test]
fn dropped_property_releases_its_source() {
    let list = ObservableList::from_vec(vec!['a']);

    {
        let prop = ListProperty::new(Some(list.clone()));
        prop.add_invalidation_listener(invalidation_listener(|_| {}));
        assert_eq!(list.listeners().len(), 1);
        // prop drops here; the forwarder only holds it weakly
    }

    assert!(list.listeners()[0].was_garbage_collected());
    list.push('b');
    assert!(list.listeners().is_empty(), "forwarder should be pruned after dispatch");
    assert_eq!(list.to_vec(), vec!['a', 'b']);
}

#[test]
fn property_outlives_a_dropped_list_handle() {
    let seen = Rc::new(Cell::new(0));
    let prop = ListProperty::new(Some(ObservableList::from_vec(vec![1])));
    prop.add_invalidation_listener(invalidation_listener({
        let seen = seen.clone();
        move |_| seen.set(seen.get() + 1)
    }));

    // The property holds the only handle; edits through get() still forward.
    if let Some(list) = prop.value() {
        list.push(2);
    }
    assert_eq!(seen.get(), 1);
    assert_eq!(prop.get().map(|l| l.len()), Some(2));
}
