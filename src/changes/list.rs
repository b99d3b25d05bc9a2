// ============================================================================
// spark-observables - List Change
// ============================================================================

use std::fmt;
use std::rc::Rc;

/// One replaced range of a list.
///
/// `from..to` is the range the added elements occupy in the list after the
/// change; `removed` holds the elements that were there before.
#[derive(Clone, PartialEq)]
pub struct ListEdit<E> {
    from: usize,
    removed: Vec<E>,
    added: Vec<E>,
}

impl<E> ListEdit<E> {
    /// Edit at `from` replacing `removed` with `added`.
    pub fn new(from: usize, removed: Vec<E>, added: Vec<E>) -> Self {
        Self {
            from,
            removed,
            added,
        }
    }

    /// Index where the edit starts.
    pub fn from(&self) -> usize {
        self.from
    }

    /// End of the added range in the new list.
    pub fn to(&self) -> usize {
        self.from + self.added.len()
    }

    /// Elements taken out, in their old order.
    pub fn removed(&self) -> &[E] {
        &self.removed
    }

    /// Elements put in, as they now appear in the list.
    pub fn added(&self) -> &[E] {
        &self.added
    }

    pub fn removed_size(&self) -> usize {
        self.removed.len()
    }

    pub fn added_size(&self) -> usize {
        self.added.len()
    }

    /// True if the edit inserted anything.
    pub fn was_added(&self) -> bool {
        !self.added.is_empty()
    }

    /// True if the edit removed anything.
    pub fn was_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// True if the edit both removed and inserted.
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }
}

impl<E: fmt::Debug> fmt::Debug for ListEdit<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListEdit")
            .field("from", &self.from)
            .field("removed", &self.removed)
            .field("added", &self.added)
            .finish()
    }
}

/// Edits applied to a list in one mutation, in ascending position order.
///
/// Each edit's positions already account for the edits before it, so
/// replaying them in order on the old contents yields [`list`](Self::list).
#[derive(Clone)]
pub struct ListChange<E> {
    list: Rc<Vec<E>>,
    edits: Rc<[ListEdit<E>]>,
}

impl<E> ListChange<E> {
    /// Change of `list` made of `edits`, in application order.
    pub fn new(list: Rc<Vec<E>>, edits: Vec<ListEdit<E>>) -> Self {
        Self {
            list,
            edits: Rc::from(edits),
        }
    }

    /// Change made of one edit.
    pub fn single(list: Rc<Vec<E>>, edit: ListEdit<E>) -> Self {
        Self::new(list, vec![edit])
    }

    /// The list contents after the change.
    pub fn list(&self) -> &[E] {
        &self.list
    }

    /// The edits, each relative to the list left by the previous one.
    pub fn edits(&self) -> &[ListEdit<E>] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Same edits, seen through another owner's contents.
    pub fn rebased(&self, list: Rc<Vec<E>>) -> Self {
        Self {
            list,
            edits: Rc::clone(&self.edits),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ListChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListChange")
            .field("edits", &&*self.edits)
            .field("size", &self.list.len())
            .finish()
    }
}
