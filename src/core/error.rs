// ============================================================================
// spark-observables - Errors
// ============================================================================

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Which listener category a callback belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Invalidation,
    Change,
    Structural,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Invalidation => write!(f, "invalidation"),
            ListenerKind::Change => write!(f, "change"),
            ListenerKind::Structural => write!(f, "structural change"),
        }
    }
}

/// Rejected write to a property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("value rejected: {reason}")]
    Rejected { reason: String },
}

impl PropertyError {
    /// Rejection with a human-readable reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Failures of bidirectional bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("cannot bind a property to itself")]
    SelfBinding,

    #[error("initial synchronization of the bound properties failed: {0}")]
    InitialSync(#[source] PropertyError),

    #[error("bidirectional binding failed, source restored to its previous value: {cause}")]
    UpdateFailed {
        #[source]
        cause: PropertyError,
    },

    #[error(
        "bidirectional binding failed and restoring the source failed too ({rollback}); \
         binding removed from both properties: {cause}"
    )]
    RollbackFailed {
        #[source]
        cause: PropertyError,
        rollback: PropertyError,
    },
}

/// Everything handed to an [`ErrorSink`](crate::ErrorSink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("{kind} listener panicked: {message}")]
    Panicked { kind: ListenerKind, message: String },

    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl ListenerError {
    /// Build from a `catch_unwind` payload.
    pub fn panicked(kind: ListenerKind, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_messages() {
        let err = ListenerError::panicked(ListenerKind::Change, &"boom");
        assert_eq!(err.to_string(), "change listener panicked: boom");

        let err = ListenerError::panicked(ListenerKind::Invalidation, &String::from("owned"));
        assert_eq!(err.to_string(), "invalidation listener panicked: owned");

        let err = ListenerError::panicked(ListenerKind::Structural, &42u8);
        assert!(err.to_string().contains("non-string"));
    }

    #[test]
    fn rollback_failure_mentions_both_errors() {
        let err = BindingError::RollbackFailed {
            cause: PropertyError::rejected("too big"),
            rollback: PropertyError::rejected("frozen"),
        };
        let text = err.to_string();
        assert!(text.contains("too big"));
        assert!(text.contains("frozen"));
    }
}
