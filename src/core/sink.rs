// ============================================================================
// spark-observables - Error Sink
// Where failed listener callbacks are reported
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::error::ListenerError;

/// Receives listener failures so one bad listener cannot block the others.
///
/// Each observable carries its own sink (configured through its options);
/// there is no process-wide handler. The default sink logs through `tracing`.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observables::{ErrorSink, ListenerError};
///
/// let seen: Rc<RefCell<Vec<String>>> = Rc::default();
/// let sink = ErrorSink::new({
///     let seen = seen.clone();
///     move |err: &ListenerError| seen.borrow_mut().push(err.to_string())
/// });
/// # let _ = sink;
/// ```
#[derive(Clone)]
pub struct ErrorSink {
    report: Rc<dyn Fn(&ListenerError)>,
}

impl ErrorSink {
    /// Sink calling `report` for every failure.
    pub fn new(report: impl Fn(&ListenerError) + 'static) -> Self {
        Self {
            report: Rc::new(report),
        }
    }

    /// Log every failure with `tracing::error!`.
    pub fn tracing() -> Self {
        Self::new(|err| tracing::error!(error = %err, "listener failed"))
    }

    /// Drop failures silently.
    pub fn ignore() -> Self {
        Self::new(|_| {})
    }

    /// Hand `error` to the sink.
    pub fn report(&self, error: &ListenerError) {
        (self.report)(error)
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ListenerKind, PropertyError};
    use std::cell::RefCell;

    #[test]
    fn custom_sink_receives_errors() {
        let seen: Rc<RefCell<Vec<ListenerError>>> = Rc::default();
        let sink = ErrorSink::new({
            let seen = seen.clone();
            move |err| seen.borrow_mut().push(err.clone())
        });

        sink.report(&ListenerError::panicked(ListenerKind::Change, &"x"));
        sink.report(&ListenerError::Binding(
            crate::core::error::BindingError::InitialSync(PropertyError::rejected("no")),
        ));

        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn default_and_ignore_do_not_panic() {
        let err = ListenerError::panicked(ListenerKind::Invalidation, &"x");
        ErrorSink::default().report(&err);
        ErrorSink::ignore().report(&err);
    }
}
