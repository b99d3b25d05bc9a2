// ============================================================================
// spark-observables - Set Change
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedSet;

/// One element added to or removed from a set.
///
/// When a mutation touches several elements the set fires one record per
/// element and may reuse the same record between calls, so listeners must
/// copy out what they need instead of keeping the reference.
#[derive(Clone)]
pub struct SetChange<E> {
    set: Rc<OrderedSet<E>>,
    element: E,
    added: bool,
}

impl<E> SetChange<E> {
    /// `element` was added to `set`.
    pub fn added(set: Rc<OrderedSet<E>>, element: E) -> Self {
        Self {
            set,
            element,
            added: true,
        }
    }

    /// `element` was removed from `set`.
    pub fn removed(set: Rc<OrderedSet<E>>, element: E) -> Self {
        Self {
            set,
            element,
            added: false,
        }
    }

    /// Reuse this record for the next element of the same firing.
    pub(crate) fn reset(&mut self, element: E, added: bool) {
        self.element = element;
        self.added = added;
    }

    /// The set contents after the change.
    pub fn set(&self) -> &OrderedSet<E> {
        &self.set
    }

    pub fn was_added(&self) -> bool {
        self.added
    }

    pub fn was_removed(&self) -> bool {
        !self.added
    }

    /// The element added or removed.
    pub fn element(&self) -> &E {
        &self.element
    }

    /// The element, if it was added.
    pub fn element_added(&self) -> Option<&E> {
        self.added.then_some(&self.element)
    }

    /// The element, if it was removed.
    pub fn element_removed(&self) -> Option<&E> {
        (!self.added).then_some(&self.element)
    }

    /// The same change, reported against `set`.
    pub fn rebased(&self, set: Rc<OrderedSet<E>>) -> Self
    where
        E: Clone,
    {
        Self {
            set,
            element: self.element.clone(),
            added: self.added,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for SetChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.added { "added" } else { "removed" };
        f.debug_struct("SetChange")
            .field(op, &self.element)
            .finish()
    }
}
