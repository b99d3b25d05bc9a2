// ============================================================================
// spark-observables - Observable Collections
// Lists, sets, maps and typed arrays that report structural changes
// ============================================================================
//
// Each collection is a cheap `Clone` handle around shared contents. The
// contents live in an `Rc` so change records can carry the post-change state
// without copying: the next mutation copies only if a record is still alive.
//
// Every mutation fires once: invalidation listeners first, then structural
// listeners with the change records. Mutations that add and remove nothing
// fire nothing; typed arrays fire on every write.
// ============================================================================

pub mod array;
pub mod list;
pub mod map;
pub mod ordered;
pub mod set;

use crate::core::sink::ErrorSink;

pub use array::{ObservableArray, ObservableFloatArray, ObservableIntegerArray};
pub use list::ObservableList;
pub use map::ObservableMap;
pub use ordered::{OrderedMap, OrderedSet};
pub use set::ObservableSet;

/// Options for creating an observable collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionOptions {
    /// Where failing listeners are reported.
    pub error_sink: ErrorSink,
}
