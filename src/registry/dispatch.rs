// ============================================================================
// spark-observables - Dispatch
// Snapshot of a registry and guarded delivery to its listeners
// ============================================================================
//
// A dispatch never holds a RefCell borrow while calling a listener. It works
// off a `Snapshot` taken up front: registrations made during the dispatch go
// to the live registry and are invisible here, and listeners removed during
// the dispatch still receive the event in flight.
//
// Every callback is wrapped in `catch_unwind`; a panic is reported to the
// observable's error sink and delivery continues with the next listener.
// =============================================================================

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use super::slots::SlotSnapshot;
use super::{AnyListener, ListenerEntry};
use crate::core::error::{ListenerError, ListenerKind};
use crate::core::sink::ErrorSink;
use crate::core::types::{InvalidationHandle, Observable};

/// Listeners of one category captured for a dispatch.
enum Captured<L> {
    None,
    One(L),
    Many(SlotSnapshot<L>),
}

impl<L> Captured<L> {
    fn is_empty(&self) -> bool {
        match self {
            Captured::None => true,
            Captured::One(_) => false,
            Captured::Many(snapshot) => snapshot.is_empty(),
        }
    }

    fn from_slots(slots: Option<SlotSnapshot<L>>) -> Self {
        match slots {
            Some(snapshot) if !snapshot.is_empty() => Captured::Many(snapshot),
            _ => Captured::None,
        }
    }
}

/// Run one listener callback, routing a panic to `sink`.
pub fn guarded(kind: ListenerKind, sink: &ErrorSink, callback: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        sink.report(&ListenerError::panicked(kind, payload.as_ref()));
    }
}

/// The listeners of a registry at the moment a notification started.
pub struct Snapshot<C, S> {
    invalidation: Captured<InvalidationHandle>,
    change: Captured<C>,
    structural: Captured<S>,
    saw_collected: Cell<bool>,
}

impl<C: ListenerEntry, S: ListenerEntry> Snapshot<C, S> {
    pub(crate) fn empty() -> Self {
        Self {
            invalidation: Captured::None,
            change: Captured::None,
            structural: Captured::None,
            saw_collected: Cell::new(false),
        }
    }

    pub(crate) fn single(listener: AnyListener<C, S>) -> Self {
        let mut snapshot = Self::empty();
        match listener {
            AnyListener::Invalidation(l) => snapshot.invalidation = Captured::One(l),
            AnyListener::Change(l) => snapshot.change = Captured::One(l),
            AnyListener::Structural(l) => snapshot.structural = Captured::One(l),
        }
        snapshot
    }

    pub(crate) fn generic(
        invalidation: Option<SlotSnapshot<InvalidationHandle>>,
        change: Option<SlotSnapshot<C>>,
        structural: Option<SlotSnapshot<S>>,
    ) -> Self {
        Self {
            invalidation: Captured::from_slots(invalidation),
            change: Captured::from_slots(change),
            structural: Captured::from_slots(structural),
            saw_collected: Cell::new(false),
        }
    }

    /// True if no listener of any category was captured.
    pub fn is_empty(&self) -> bool {
        self.invalidation.is_empty() && self.change.is_empty() && self.structural.is_empty()
    }

    pub fn has_invalidation(&self) -> bool {
        !self.invalidation.is_empty()
    }

    /// True if change listeners were captured.
    pub fn has_change(&self) -> bool {
        !self.change.is_empty()
    }

    /// True if structural listeners were captured.
    pub fn has_structural(&self) -> bool {
        !self.structural.is_empty()
    }

    /// Whether any skipped listener had been collected. The owner prunes
    /// its registry after the dispatch when this is set.
    pub fn saw_collected(&self) -> bool {
        self.saw_collected.get()
    }

    fn each<L: ListenerEntry>(
        &self,
        captured: &Captured<L>,
        kind: ListenerKind,
        sink: &ErrorSink,
        mut deliver: impl FnMut(&L),
    ) {
        let mut visit = |listener: &L| {
            if listener.was_garbage_collected() {
                self.saw_collected.set(true);
                return;
            }
            guarded(kind, sink, || deliver(listener));
        };
        match captured {
            Captured::None => {}
            Captured::One(listener) => visit(listener),
            Captured::Many(snapshot) => snapshot.iter().for_each(visit),
        }
    }

    /// Deliver an invalidation to every captured invalidation listener.
    pub fn notify_invalidated(&self, observable: &dyn Observable, sink: &ErrorSink) {
        self.each(&self.invalidation, ListenerKind::Invalidation, sink, |l| {
            l.invalidated(observable)
        });
    }

    /// Call `deliver` for every captured change listener.
    pub fn notify_changed(&self, sink: &ErrorSink, deliver: impl FnMut(&C)) {
        self.each(&self.change, ListenerKind::Change, sink, deliver);
    }

    /// Call `deliver` for every captured structural listener.
    pub fn notify_structural(&self, sink: &ErrorSink, deliver: impl FnMut(&S)) {
        self.each(&self.structural, ListenerKind::Structural, sink, deliver);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::invalidation_listener;
    use crate::primitives::constant::ConstantValue;
    use crate::registry::{ListenerRegistry, NoListener, WeakListener};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Registry = ListenerRegistry<NoListener, NoListener>;

    fn recording(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> InvalidationHandle {
        let log = log.clone();
        invalidation_listener(move |_| log.borrow_mut().push(name))
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let registry = Registry::default()
            .add_invalidation(recording(&log, "a"))
            .add_invalidation(recording(&log, "b"))
            .add_invalidation(recording(&log, "c"));

        let observable = ConstantValue::new(0);
        registry.snapshot().notify_invalidated(&observable, &ErrorSink::ignore());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn panicking_listener_does_not_stop_others() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = ErrorSink::new({
            let errors = errors.clone();
            move |err| errors.borrow_mut().push(err.clone())
        });

        let registry = Registry::default()
            .add_invalidation(invalidation_listener(|_| panic!("bad listener")))
            .add_invalidation(recording(&log, "after"));

        let observable = ConstantValue::new(0);
        registry.snapshot().notify_invalidated(&observable, &sink);

        assert_eq!(*log.borrow(), vec!["after"]);
        assert_eq!(
            *errors.borrow(),
            vec![ListenerError::Panicked {
                kind: ListenerKind::Invalidation,
                message: "bad listener".into(),
            }]
        );
    }

    #[test]
    fn collected_listeners_are_skipped_and_flagged() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let target = recording(&log, "gone");
        let registry = Registry::default()
            .add_invalidation(WeakListener::invalidation(&target))
            .add_invalidation(recording(&log, "live"));
        drop(target);

        let snapshot = registry.snapshot();
        snapshot.notify_invalidated(&ConstantValue::new(0), &ErrorSink::ignore());

        assert_eq!(*log.borrow(), vec!["live"]);
        assert!(snapshot.saw_collected());
    }
}
