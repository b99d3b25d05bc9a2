// ============================================================================
// spark-observables - Core Module
// Observable and listener traits, errors and the error sink
// ============================================================================

pub mod error;
pub mod sink;
pub mod types;

// Re-export commonly used items
pub use error::{BindingError, ListenerError, ListenerKind, PropertyError};
pub use sink::ErrorSink;
pub use types::{
    ArrayChangeHandle, ArrayChangeListener, ChangeHandle, ChangeListener, EqualsFn,
    InvalidationHandle, InvalidationListener, ListChangeHandle, ListChangeListener, ListenerKey,
    MapChangeHandle, MapChangeListener, Observable, ObservableValue, SetChangeHandle,
    SetChangeListener, WritableValue, default_equals,
};
