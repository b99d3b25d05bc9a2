// ============================================================================
// spark-observables - Listener Slots
// Growable listener buffer shared with in-flight dispatches
// ============================================================================
//
// The physical buffer is `Rc<Vec<Option<L>>>`; its length is the capacity,
// and `len` counts the occupied prefix. A dispatch snapshot clones the `Rc`,
// so while a notification is running the buffer is shared: every mutation
// then copies first and the running dispatch keeps iterating the old buffer.
// When nobody else holds the buffer it is edited in place.
// =============================================================================

use std::rc::Rc;

use super::ListenerEntry;
use super::weak::prune_collected;

/// Listener buffer of one category inside a generic registry.
pub struct ListenerSlots<L> {
    slots: Rc<Vec<Option<L>>>,
    len: usize,
}

/// Geometric growth used whenever the buffer is full.
pub(crate) fn grown_capacity(capacity: usize) -> usize {
    capacity * 3 / 2 + 1
}

impl<L: ListenerEntry> ListenerSlots<L> {
    /// Buffer holding exactly `listeners`, capacity equal to their count.
    pub fn from_listeners(listeners: Vec<L>) -> Self {
        let len = listeners.len();
        Self {
            slots: Rc::new(listeners.into_iter().map(Some).collect()),
            len,
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical size of the buffer, occupied or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True while a dispatch snapshot holds this buffer.
    pub fn is_locked(&self) -> bool {
        Rc::strong_count(&self.slots) > 1
    }

    /// Registered listeners in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.slots[..self.len].iter().flatten()
    }

    pub fn contains(&self, listener: &L) -> bool {
        self.iter().any(|l| l.same_listener(listener))
    }

    /// Append a listener; already registered listeners are ignored.
    pub fn push(&mut self, listener: L) {
        if self.contains(&listener) {
            return;
        }

        let capacity = self.capacity();
        if self.is_locked() {
            let new_capacity = if self.len < capacity {
                capacity
            } else {
                grown_capacity(capacity)
            };
            self.copy_to_capacity(new_capacity);
        } else if self.len == capacity {
            // Pruning a full buffer is the alternative to growing it.
            if let Some(slots) = Rc::get_mut(&mut self.slots) {
                self.len = prune_collected(slots, self.len);
            }
            if self.len == capacity {
                self.copy_to_capacity(grown_capacity(capacity));
            }
        }

        match Rc::get_mut(&mut self.slots) {
            Some(slots) => slots[self.len] = Some(listener),
            None => {
                // The branches above leave the buffer unshared; copy if not.
                let capacity = self.capacity();
                self.copy_to_capacity(capacity);
                if let Some(slots) = Rc::get_mut(&mut self.slots) {
                    slots[self.len] = Some(listener);
                }
            }
        }
        self.len += 1;
    }

    /// Remove the first listener equal to `listener`. Returns whether one was found.
    pub fn remove(&mut self, listener: &L) -> bool {
        let Some(index) = self.slots[..self.len]
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|l| l.same_listener(listener)))
        else {
            return false;
        };

        match Rc::get_mut(&mut self.slots) {
            Some(slots) => {
                slots[index] = None;
                slots[index..self.len].rotate_left(1);
            }
            None => {
                // Locked: build a fresh buffer, leave the dispatched one alone.
                let mut slots = Vec::with_capacity(self.capacity());
                slots.extend(self.slots[..index].iter().cloned());
                slots.extend(self.slots[index + 1..self.len].iter().cloned());
                slots.resize(self.capacity(), None);
                self.slots = Rc::new(slots);
            }
        }
        self.len -= 1;
        true
    }

    /// Drop every collected listener. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        if !self.iter().any(|l| l.was_garbage_collected()) {
            return 0;
        }
        if self.is_locked() {
            let capacity = self.capacity();
            self.copy_to_capacity(capacity);
        }
        let before = self.len;
        if let Some(slots) = Rc::get_mut(&mut self.slots) {
            self.len = prune_collected(slots, self.len);
        }
        before - self.len
    }

    /// Take the only listener out of a buffer of length one.
    pub fn into_single(self) -> Option<L> {
        if self.len != 1 {
            return None;
        }
        self.slots[0].clone()
    }

    /// Share the buffer with a dispatch. Until the snapshot is dropped,
    /// mutations copy the buffer first.
    pub fn snapshot(&self) -> SlotSnapshot<L> {
        SlotSnapshot {
            slots: Rc::clone(&self.slots),
            len: self.len,
        }
    }

    fn copy_to_capacity(&mut self, capacity: usize) {
        let mut slots = Vec::with_capacity(capacity);
        slots.extend(self.slots[..self.len].iter().cloned());
        slots.resize(capacity, None);
        self.slots = Rc::new(slots);
    }
}

/// The buffer and bound captured when a dispatch starts.
pub struct SlotSnapshot<L> {
    slots: Rc<Vec<Option<L>>>,
    len: usize,
}

impl<L> SlotSnapshot<L> {
    /// Number of listeners captured.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Captured listeners in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.slots[..self.len].iter().flatten()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InvalidationHandle, invalidation_listener};

    fn listeners(n: usize) -> Vec<InvalidationHandle> {
        (0..n).map(|_| invalidation_listener(|_| {})).collect()
    }

    fn same(a: &[InvalidationHandle], b: &[InvalidationHandle]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_listener(y))
    }

    #[test]
    fn growth_is_geometric() {
        assert_eq!(grown_capacity(1), 2);
        assert_eq!(grown_capacity(2), 4);
        assert_eq!(grown_capacity(4), 7);
        assert_eq!(grown_capacity(7), 11);
    }

    #[test]
    fn push_grows_only_when_full() {
        let all = listeners(5);
        let mut slots = ListenerSlots::from_listeners(all[..2].to_vec());
        assert_eq!(slots.capacity(), 2);

        slots.push(all[2].clone());
        assert_eq!(slots.capacity(), 4);
        slots.push(all[3].clone());
        assert_eq!(slots.capacity(), 4);
        slots.push(all[4].clone());
        assert_eq!(slots.capacity(), 7);

        let current: Vec<_> = slots.iter().cloned().collect();
        assert!(same(&current, &all));
    }

    #[test]
    fn push_ignores_duplicates() {
        let all = listeners(2);
        let mut slots = ListenerSlots::from_listeners(all.clone());
        slots.push(all[0].clone());
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn remove_shifts_and_clears_tail() {
        let all = listeners(4);
        let mut slots = ListenerSlots::from_listeners(all.clone());

        assert!(slots.remove(&all[1]));
        assert_eq!(slots.len(), 3);
        assert!(slots.slots[3].is_none());

        let current: Vec<_> = slots.iter().cloned().collect();
        assert!(same(&current, &[all[0].clone(), all[2].clone(), all[3].clone()]));

        assert!(!slots.remove(&all[1]));
    }

    #[test]
    fn mutation_while_locked_copies() {
        let all = listeners(4);
        let mut slots = ListenerSlots::from_listeners(all[..3].to_vec());
        let snapshot = slots.snapshot();
        assert!(slots.is_locked());

        slots.remove(&all[0]);
        slots.push(all[3].clone());

        // The snapshot still sees the original three, in order.
        let seen: Vec<_> = snapshot.iter().cloned().collect();
        assert!(same(&seen, &all[..3]));

        drop(snapshot);
        assert!(!slots.is_locked());
        let current: Vec<_> = slots.iter().cloned().collect();
        assert!(same(&current, &all[1..]));
    }

    #[test]
    fn into_single_requires_exactly_one() {
        let all = listeners(2);
        assert!(ListenerSlots::from_listeners(all.clone()).into_single().is_none());

        let mut slots = ListenerSlots::from_listeners(all.clone());
        slots.remove(&all[0]);
        let only = slots.into_single().expect("one listener left");
        assert!(only.same_listener(&all[1]));
    }
}
