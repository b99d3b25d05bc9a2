use spark_observables::{
    ListChange, ListProperty, MapChange, MapProperty, ObservableList, ObservableMap, Observable,
    ObservableValue, change_listener, invalidation_listener, list_listener, map_listener,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Edit = (usize, Vec<char>, Vec<char>);

fn record_edits(prop: &ListProperty<char>) -> Rc<RefCell<Vec<Vec<Edit>>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    prop.add_listener(list_listener({
        let log = log.clone();
        move |change: &ListChange<char>| {
            let edits = change
                .edits()
                .iter()
                .map(|e| (e.from(), e.removed().to_vec(), e.added().to_vec()))
                .collect();
            log.borrow_mut().push(edits);
        }
    }));
    log
}

#[test]
fn replacing_a_list_is_one_coalesced_edit() {
    let prop = ListProperty::new(Some(ObservableList::from_vec(vec!['a', 'b', 'c'])));
    let log = record_edits(&prop);

    prop.set(Some(ObservableList::from_vec(vec!['x', 'y'])));

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0], vec![(0, vec!['a', 'b', 'c'], vec!['x', 'y'])]);
    let (from, removed, added) = &log[0][0];
    assert_eq!((*from, removed.len(), added.len()), (0, 3, 2));
}

#[test]
fn from_nothing_is_add_only_and_to_nothing_is_remove_only() {
    let prop = ListProperty::new(None);
    let log = record_edits(&prop);

    prop.set(Some(ObservableList::from_vec(vec!['x'])));
    prop.set(None);

    assert_eq!(
        *log.borrow(),
        vec![vec![(0, vec![], vec!['x'])], vec![(0, vec!['x'], vec![])]]
    );
}

#[test]
fn empty_to_empty_reports_no_edit() {
    let prop = ListProperty::new(Some(ObservableList::new()));
    let log = record_edits(&prop);
    let changes = Rc::new(Cell::new(0));
    prop.add_change_listener(change_listener({
        let changes = changes.clone();
        move |_, _: &Option<ObservableList<char>>, _: &Option<ObservableList<char>>| {
            changes.set(changes.get() + 1)
        }
    }));

    prop.set(Some(ObservableList::new()));

    assert_eq!(changes.get(), 1);
    assert!(log.borrow().is_empty());
}

#[test]
fn replacing_a_map_reports_each_key_in_old_then_new_order() {
    let old: ObservableMap<&str, i32> = [("k1", 1), ("k2", 2)].into_iter().collect();
    let new: ObservableMap<&str, i32> = [("k2", 3), ("k3", 4)].into_iter().collect();
    let prop = MapProperty::new(Some(old));
    let log = Rc::new(RefCell::new(Vec::new()));
    prop.add_listener(map_listener({
        let log = log.clone();
        move |change: &MapChange<&str, i32>| {
            let kind = match (change.was_removed(), change.was_added()) {
                (true, true) => "update",
                (true, false) => "remove",
                _ => "add",
            };
            log.borrow_mut().push((
                kind,
                *change.key(),
                change.value_removed().copied(),
                change.value_added().copied(),
            ));
        }
    }));

    prop.set(Some(new));

    assert_eq!(
        *log.borrow(),
        vec![
            ("remove", "k1", Some(1), None),
            ("update", "k2", Some(2), Some(3)),
            ("add", "k3", None, Some(4)),
        ]
    );
}

#[test]
fn map_change_records_see_the_new_contents() {
    let prop = MapProperty::new(Some([("a", 1)].into_iter().collect::<ObservableMap<_, _>>()));
    let sizes = Rc::new(RefCell::new(Vec::new()));
    prop.add_listener(map_listener({
        let sizes = sizes.clone();
        move |change: &MapChange<&str, i32>| sizes.borrow_mut().push(change.map().len())
    }));

    prop.set(Some([("b", 2), ("c", 3)].into_iter().collect()));

    assert_eq!(*sizes.borrow(), vec![2, 2, 2]);
}

// Elements count their clones, so we can tell whether a diff was built.
thread_local! {
    static CLONES: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, PartialEq)]
struct Tracked(u32);

impl Clone for Tracked {
    fn clone(&self) -> Self {
        CLONES.with(|c| c.set(c.get() + 1));
        Tracked(self.0)
    }
}

#[test]
fn no_diff_without_structural_listeners() {
    let prop = ListProperty::new(Some(ObservableList::from_vec(vec![Tracked(1), Tracked(2)])));
    let changes = Rc::new(Cell::new(0));
    prop.add_change_listener(change_listener({
        let changes = changes.clone();
        move |_, _: &Option<ObservableList<Tracked>>, _: &Option<ObservableList<Tracked>>| {
            changes.set(changes.get() + 1)
        }
    }));

    CLONES.with(|c| c.set(0));
    prop.set(Some(ObservableList::from_vec(vec![Tracked(3)])));
    assert_eq!(changes.get(), 1);
    assert_eq!(CLONES.with(Cell::get), 0);

    prop.add_listener(list_listener(|_: &ListChange<Tracked>| {}));
    prop.set(Some(ObservableList::from_vec(vec![Tracked(4)])));
    assert!(CLONES.with(Cell::get) > 0);
}

#[test]
fn same_instance_fires_invalidation_only() {
    let list = ObservableList::from_vec(vec!['a']);
    let prop = ListProperty::new(Some(list));
    let log = record_edits(&prop);
    let invalidations = Rc::new(Cell::new(0));
    let changes = Rc::new(Cell::new(0));
    prop.add_invalidation_listener(invalidation_listener({
        let invalidations = invalidations.clone();
        move |_| invalidations.set(invalidations.get() + 1)
    }));
    prop.add_change_listener(change_listener({
        let changes = changes.clone();
        move |_, _: &Option<ObservableList<char>>, _: &Option<ObservableList<char>>| {
            changes.set(changes.get() + 1)
        }
    }));

    prop.fire_value_changed();

    assert_eq!(invalidations.get(), 1);
    assert_eq!(changes.get(), 0);
    assert!(log.borrow().is_empty());
    assert_eq!(prop.value().map(|l| l.len()), Some(1));
}
