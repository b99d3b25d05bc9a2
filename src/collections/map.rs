// ============================================================================
// spark-observables - ObservableMap
// An insertion-ordered map that reports one change per entry
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use super::{CollectionOptions, OrderedMap};
use crate::changes::MapChange;
use crate::core::sink::ErrorSink;
use crate::core::types::{InvalidationHandle, MapChangeHandle, Observable};
use crate::helpers::{CollectionHelper, Diffable, SourceForwarder};

/// `(key, removed value, added value)` for one changed entry.
type EntryChange<K, V> = (K, Option<V>, Option<V>);

/// Emit every entry change, reusing one record for all of them.
fn emit_each<K, V>(
    map: Rc<OrderedMap<K, V>>,
    entries: Vec<EntryChange<K, V>>,
    emit: &mut dyn FnMut(&MapChange<K, V>),
) {
    let mut change: Option<MapChange<K, V>> = None;
    for (key, removed, added) in entries {
        if let Some(change) = change.as_mut() {
            change.reset(key, removed, added);
        } else {
            change = Some(MapChange::new(Rc::clone(&map), key, removed, added));
        }
        if let Some(change) = &change {
            emit(change);
        }
    }
}

/// Entry changes turning `old` into `new`: removals and updates in `old`'s
/// order, then additions in `new`'s order.
fn diff<K, V>(old: &OrderedMap<K, V>, new: &OrderedMap<K, V>) -> Vec<EntryChange<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    let mut entries = Vec::new();
    for (key, old_value) in old.iter() {
        match new.get(key) {
            None => entries.push((key.clone(), Some(old_value.clone()), None)),
            Some(new_value) if new_value != old_value => {
                entries.push((key.clone(), Some(old_value.clone()), Some(new_value.clone())))
            }
            Some(_) => {}
        }
    }
    for (key, new_value) in new.iter() {
        if !old.contains_key(key) {
            entries.push((key.clone(), None, Some(new_value.clone())));
        }
    }
    entries
}

struct MapInner<K, V> {
    entries: RefCell<Rc<OrderedMap<K, V>>>,
    helper: CollectionHelper<MapChangeHandle<K, V>>,
    error_sink: ErrorSink,
}

/// An observable map that iterates in insertion order.
///
/// Clones share the same map. Writing a value equal to the present one is
/// not a change.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ObservableMap, map_listener};
///
/// let map: ObservableMap<&str, i32> = [("k1", 1), ("k2", 2)].into_iter().collect();
/// let updates = Rc::new(RefCell::new(Vec::new()));
/// map.add_listener(map_listener({
///     let updates = updates.clone();
///     move |change| {
///         if change.was_updated() {
///             updates.borrow_mut().push(*change.key());
///         }
///     }
/// }));
///
/// map.insert("k2", 2);
/// map.insert("k2", 3);
/// assert_eq!(*updates.borrow(), vec!["k2"]);
/// ```
pub struct ObservableMap<K, V> {
    inner: Rc<MapInner<K, V>>,
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Empty map.
    pub fn new() -> Self {
        Self::with_options(OrderedMap::new(), CollectionOptions::default())
    }

    /// Map holding `entries`, reporting listener failures to `options.error_sink`.
    pub fn with_options(entries: OrderedMap<K, V>, options: CollectionOptions) -> Self {
        Self {
            inner: Rc::new(MapInner {
                entries: RefCell::new(Rc::new(entries)),
                helper: CollectionHelper::new(),
                error_sink: options.error_sink,
            }),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Clone of the value under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }

    /// Whether `key` has an entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// Entries in insertion order.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The current contents, shared. Later mutations do not affect it.
    pub fn snapshot(&self) -> Rc<OrderedMap<K, V>> {
        Rc::clone(&self.inner.entries.borrow())
    }

    fn edit<R>(&self, f: impl FnOnce(&mut OrderedMap<K, V>) -> R) -> R {
        let mut entries = self.inner.entries.borrow_mut();
        f(Rc::make_mut(&mut entries))
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        if self.inner.entries.borrow().get(&key) == Some(&value) {
            return Some(value);
        }
        let previous = self.edit(|entries| entries.insert(key.clone(), value.clone()));
        self.fire(vec![(key, previous.clone(), Some(value))]);
        previous
    }

    /// Remove `key`, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = self.edit(|entries| entries.remove(key))?;
        self.fire(vec![(key.clone(), Some(removed.clone()), None)]);
        Some(removed)
    }

    /// Remove every entry, one change per key.
    pub fn clear(&self) {
        let old = self.edit(std::mem::take);
        let entries = old
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone()), None))
            .collect();
        self.fire(entries);
    }

    /// Replace the contents with `entries`.
    pub fn set_all(&self, entries: impl IntoIterator<Item = (K, V)>) {
        let new: OrderedMap<K, V> = entries.into_iter().collect();
        let changes = diff(&self.snapshot(), &new);
        *self.inner.entries.borrow_mut() = Rc::new(new);
        self.fire(changes);
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        let current = self.snapshot();
        let removed: Vec<EntryChange<K, V>> = current
            .iter()
            .filter(|(k, v)| !keep(*k, *v))
            .map(|(k, v)| (k.clone(), Some(v.clone()), None))
            .collect();
        drop(current);
        if removed.is_empty() {
            return;
        }
        self.edit(|entries| {
            for (key, _, _) in &removed {
                entries.remove(key);
            }
        });
        self.fire(removed);
    }

    fn fire(&self, entries: Vec<EntryChange<K, V>>) {
        if entries.is_empty() {
            return;
        }
        let map = self.snapshot();
        self.inner.helper.fire(self, &self.inner.error_sink, |emit| {
            emit_each(map, entries, emit)
        });
    }

    /// Register a listener for per-key changes.
    pub fn add_listener(&self, listener: MapChangeHandle<K, V>) {
        self.inner.helper.add_listener(listener);
    }

    /// Unregister a map listener.
    pub fn remove_listener(&self, listener: &MapChangeHandle<K, V>) {
        self.inner.helper.remove_listener(listener);
    }

    /// Registered map listeners.
    pub fn listeners(&self) -> Vec<MapChangeHandle<K, V>> {
        self.inner.helper.listeners()
    }
}

impl<K, V> Observable for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn add_invalidation_listener(&self, listener: InvalidationHandle) {
        self.inner.helper.add_invalidation_listener(listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationHandle) {
        self.inner.helper.remove_invalidation_listener(listener);
    }
}

impl<K, V> Default for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_options(iter.into_iter().collect(), CollectionOptions::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.inner.entries.borrow(), f)
    }
}

impl<K, V> Diffable for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    type Change = MapChange<K, V>;
    type Handle = MapChangeHandle<K, V>;

    fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn add_structural_listener(&self, listener: MapChangeHandle<K, V>) {
        self.add_listener(listener);
    }

    fn remove_structural_listener(&self, listener: &MapChangeHandle<K, V>) {
        self.remove_listener(listener);
    }

    fn forwarding_listener(forwarder: SourceForwarder<MapChange<K, V>>) -> MapChangeHandle<K, V> {
        Rc::new(forwarder)
    }

    fn synthesize(old: Option<&Self>, new: Option<&Self>, emit: &mut dyn FnMut(&MapChange<K, V>)) {
        let old = old.map_or_else(|| Rc::new(OrderedMap::new()), Self::snapshot);
        let new = new.map_or_else(|| Rc::new(OrderedMap::new()), Self::snapshot);
        let entries = diff(&old, &new);
        emit_each(new, entries, emit);
    }

    fn adapt(change: &MapChange<K, V>, current: &Self) -> MapChange<K, V> {
        change.rebased(current.snapshot())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::map_listener;

    type Logged = (&'static str, Option<i32>, Option<i32>);

    fn recorder(map: &ObservableMap<&'static str, i32>) -> Rc<RefCell<Vec<Logged>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        map.add_listener(map_listener({
            let log = log.clone();
            move |change: &MapChange<&'static str, i32>| {
                log.borrow_mut().push((
                    *change.key(),
                    change.value_removed().copied(),
                    change.value_added().copied(),
                ))
            }
        }));
        log
    }

    #[test]
    fn insert_update_remove() {
        let map = ObservableMap::new();
        let log = recorder(&map);

        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("a", 1), Some(1));
        assert_eq!(map.insert("a", 2), Some(1));
        assert_eq!(map.remove(&"a"), Some(2));
        assert_eq!(map.remove(&"a"), None);

        assert_eq!(
            *log.borrow(),
            vec![("a", None, Some(1)), ("a", Some(1), Some(2)), ("a", Some(2), None)]
        );
    }

    #[test]
    fn set_all_orders_old_then_new() {
        let map: ObservableMap<_, _> = [("k1", 1), ("k2", 2)].into_iter().collect();
        let log = recorder(&map);

        map.set_all([("k2", 3), ("k3", 4)]);

        assert_eq!(
            *log.borrow(),
            vec![("k1", Some(1), None), ("k2", Some(2), Some(3)), ("k3", None, Some(4))]
        );
        assert_eq!(map.to_vec(), vec![("k2", 3), ("k3", 4)]);
    }

    #[test]
    fn retain_and_clear() {
        let map: ObservableMap<_, _> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let log = recorder(&map);

        map.retain(|_, v| *v != 2);
        map.clear();
        map.clear();

        assert_eq!(
            *log.borrow(),
            vec![("b", Some(2), None), ("a", Some(1), None), ("c", Some(3), None)]
        );
    }
}
