// ============================================================================
// spark-observables - Change Records
// Structural diffs delivered to list, set, map and array listeners
// ============================================================================
//
// Records carry a snapshot (`Rc`) of the collection contents after the
// change, so listeners can inspect the result without borrowing the
// collection. Set and map records describe one element each; a single
// firing may reuse one record for several elements, so listeners must not
// keep references past their callback (the borrow checker enforces this).
// ============================================================================

mod array;
mod list;
mod map;
mod set;

pub use array::ArrayChange;
pub use list::{ListChange, ListEdit};
pub use map::MapChange;
pub use set::SetChange;
