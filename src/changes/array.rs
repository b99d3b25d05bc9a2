// ============================================================================
// spark-observables - Array Change
// ============================================================================

use std::rc::Rc;

/// A range of a typed array that was written, possibly with a size change.
///
/// `from..to` is the written range in the array after the change. When the
/// array shrank the range is empty and `from == to == len`.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ArrayChange, ObservableIntegerArray, array_listener};
///
/// let array = ObservableIntegerArray::from_vec(vec![1, 2, 3]);
/// let ranges = Rc::new(RefCell::new(Vec::new()));
/// array.add_listener(array_listener({
///     let ranges = ranges.clone();
///     move |change: &ArrayChange<i32>| {
///         ranges.borrow_mut().push((change.size_changed(), change.from(), change.to()))
///     }
/// }));
///
/// array.set(0, 10);
/// array.add_all(&[4]);
/// assert_eq!(*ranges.borrow(), vec![(false, 0, 1), (true, 3, 4)]);
/// ```
#[derive(Debug, Clone)]
pub struct ArrayChange<N> {
    array: Rc<Vec<N>>,
    size_changed: bool,
    from: usize,
    to: usize,
}

impl<N> ArrayChange<N> {
    /// Record a write to `from..to`.
    pub fn new(array: Rc<Vec<N>>, size_changed: bool, from: usize, to: usize) -> Self {
        Self {
            array,
            size_changed,
            from,
            to,
        }
    }

    /// The array contents after the change.
    pub fn array(&self) -> &[N] {
        &self.array
    }

    /// Whether the write changed the array length.
    pub fn size_changed(&self) -> bool {
        self.size_changed
    }

    /// First written index.
    pub fn from(&self) -> usize {
        self.from
    }

    /// One past the last written index.
    pub fn to(&self) -> usize {
        self.to
    }
}
