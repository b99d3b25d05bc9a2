// ============================================================================
// spark-observables - Primitives Module
// Properties, constants and bidirectional bindings
// ============================================================================

pub mod bind;
pub mod collection_property;
pub mod constant;
pub mod property;

pub use bind::{BidirectionalBinding, bind_bidirectional, unbind_bidirectional};
pub use collection_property::{CollectionProperty, ListProperty, MapProperty, SetProperty};
pub use constant::ConstantValue;
pub use property::{PropertyOptions, SimpleProperty, Validator};
