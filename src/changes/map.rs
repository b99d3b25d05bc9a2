// ============================================================================
// spark-observables - Map Change
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;

/// One entry of a map that was added, removed or had its value replaced.
///
/// An update carries both values: `was_added()` and `was_removed()` are
/// both true.
#[derive(Clone)]
pub struct MapChange<K, V> {
    map: Rc<OrderedMap<K, V>>,
    key: K,
    added: Option<V>,
    removed: Option<V>,
}

impl<K, V> MapChange<K, V> {
    /// Change of one `key`: `removed` is the old value, `added` the new one.
    pub fn new(map: Rc<OrderedMap<K, V>>, key: K, removed: Option<V>, added: Option<V>) -> Self {
        Self {
            map,
            key,
            added,
            removed,
        }
    }

    /// Reuse this record for the next entry of the same firing.
    pub(crate) fn reset(&mut self, key: K, removed: Option<V>, added: Option<V>) {
        self.key = key;
        self.removed = removed;
        self.added = added;
    }

    /// The map contents after the change.
    pub fn map(&self) -> &OrderedMap<K, V> {
        &self.map
    }

    /// The key that changed.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value now stored under the key.
    pub fn value_added(&self) -> Option<&V> {
        self.added.as_ref()
    }

    /// The value previously stored under the key.
    pub fn value_removed(&self) -> Option<&V> {
        self.removed.as_ref()
    }

    /// True if the key has a new value.
    pub fn was_added(&self) -> bool {
        self.added.is_some()
    }

    /// True if the key lost its old value.
    pub fn was_removed(&self) -> bool {
        self.removed.is_some()
    }

    /// True if an existing value was replaced.
    pub fn was_updated(&self) -> bool {
        self.was_added() && self.was_removed()
    }

    /// The same change, reported against `map`.
    pub fn rebased(&self, map: Rc<OrderedMap<K, V>>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        Self {
            map,
            key: self.key.clone(),
            added: self.added.clone(),
            removed: self.removed.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapChange")
            .field("key", &self.key)
            .field("removed", &self.removed)
            .field("added", &self.added)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_both_sides() {
        let map = Rc::new(OrderedMap::from_iter([("k", 3)]));
        let change = MapChange::new(map, "k", Some(2), Some(3));
        assert!(change.was_updated());
        assert_eq!(change.value_removed(), Some(&2));
        assert_eq!(change.value_added(), Some(&3));
    }
}
