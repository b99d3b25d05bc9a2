// ============================================================================
// spark-observables - ConstantValue
// An observable value that never changes
// ============================================================================

use std::fmt;

use crate::core::types::{ChangeHandle, InvalidationHandle, Observable, ObservableValue};

/// An immutable observable. It never fires, so it keeps no listeners.
#[derive(Clone, PartialEq)]
pub struct ConstantValue<T> {
    value: T,
}

impl<T: Clone> ConstantValue<T> {
    /// Constant holding `value`.
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The value.
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T> Observable for ConstantValue<T> {
    fn add_invalidation_listener(&self, _listener: InvalidationHandle) {}

    fn remove_invalidation_listener(&self, _listener: &InvalidationHandle) {}
}

impl<T: Clone> ObservableValue<T> for ConstantValue<T> {
    fn value(&self) -> T {
        self.value.clone()
    }

    fn add_change_listener(&self, _listener: ChangeHandle<T>) {}

    fn remove_change_listener(&self, _listener: &ChangeHandle<T>) {}
}

impl<T: fmt::Debug> fmt::Debug for ConstantValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstantValue").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::invalidation_listener;

    #[test]
    fn registration_is_a_no_op() {
        let constant = ConstantValue::new("fixed");
        constant.add_invalidation_listener(invalidation_listener(|_| panic!("never fires")));
        assert_eq!(constant.value(), "fixed");
        assert_eq!(*constant.get(), "fixed");
    }
}
