//! Animation
//!
//! Binds one [`Action`] to its own elapsed-time counter and start/finish
//! lifecycle. The scheduler owns animations and refers to them by
//! [`AnimationId`](crate::scheduler::AnimationId); identity is the id, never
//! the wrapped value.
//!
//! All methods take `&self` so that an action hook may call back into the
//! scheduler while its own animation is mid-update. A lifecycle hook requested
//! while the wrapped action is already executing is deferred until that call
//! returns.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::action::Action;

pub struct Animation {
    action: RefCell<Action>,
    // Fixed at construction so they stay readable while the action runs
    has_duration: bool,
    duration: f64,
    elapsed_time: Cell<f64>,
    started: Cell<bool>,
    start_deferred: Cell<bool>,
    finish_deferred: Cell<bool>,
}

impl Animation {
    pub fn new(action: Action) -> Self {
        Self {
            has_duration: action.is_bounded(),
            duration: action.duration(),
            action: RefCell::new(action),
            elapsed_time: Cell::new(0.0),
            started: Cell::new(false),
            start_deferred: Cell::new(false),
            finish_deferred: Cell::new(false),
        }
    }

    /// Seconds of time this animation has been advanced by
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time.get()
    }

    /// True if the wrapped action is bounded
    pub fn has_duration(&self) -> bool {
        self.has_duration
    }

    /// Duration of a bounded action, 0 otherwise
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// True once the start hook has fired
    pub fn has_started(&self) -> bool {
        self.started.get()
    }

    /// Fire the start hook. Only the first call has any effect.
    pub fn on_start(&self) {
        if self.started.replace(true) {
            return;
        }

        match self.action.try_borrow_mut() {
            Ok(mut action) => action.did_become_active(),
            Err(_) => {
                self.start_deferred.set(true);
                return;
            }
        }

        self.flush_deferred();
    }

    /// Tell the wrapped action it has become inactive
    pub fn on_finish(&self) {
        match self.action.try_borrow_mut() {
            Ok(mut action) => action.did_become_inactive(),
            Err(_) => {
                self.finish_deferred.set(true);
                return;
            }
        }

        self.flush_deferred();
    }

    /// Set the elapsed time and dispatch it to the action
    ///
    /// Bounded actions receive `elapsed_time / duration`. Callers clamp
    /// `elapsed_time` to the duration; no clamping happens here.
    pub fn advance(&self, elapsed_time: f64) {
        match self.action.try_borrow_mut() {
            Ok(mut action) => {
                self.elapsed_time.set(elapsed_time);
                action.update(elapsed_time);
            }
            Err(_) => {
                tracing::warn!(
                    "Animation: skipping re-entrant advance to {:.4}s while action is running",
                    elapsed_time
                );
                return;
            }
        }

        self.flush_deferred();
    }

    fn flush_deferred(&self) {
        // Hooks may defer again if they re-enter, so loop until quiet
        loop {
            if self.start_deferred.replace(false) {
                self.action.borrow_mut().did_become_active();
            } else if self.finish_deferred.replace(false) {
                self.action.borrow_mut().did_become_inactive();
            } else {
                break;
            }
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("duration", &self.duration)
            .field("elapsed_time", &self.elapsed_time.get())
            .field("started", &self.started.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BoundedFn, UnboundedFn};
    use std::rc::Rc;

    fn recorder() -> Rc<RefCell<Vec<f64>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_wrap_defaults() {
        let animation = Animation::new(Action::bounded(BoundedFn::new(1.5, |_| {})).unwrap());
        assert_eq!(animation.elapsed_time(), 0.0);
        assert!(!animation.has_started());
        assert!(animation.has_duration());
        assert_eq!(animation.duration(), 1.5);

        let animation = Animation::new(Action::unbounded(UnboundedFn::new(|_| {})));
        assert!(!animation.has_duration());
        assert_eq!(animation.duration(), 0.0);
    }

    #[test]
    fn test_advance_bounded_normalizes() {
        let seen = recorder();
        let seen_clone = Rc::clone(&seen);
        let animation = Animation::new(
            Action::bounded(BoundedFn::new(2.0, move |t| seen_clone.borrow_mut().push(t))).unwrap(),
        );

        animation.advance(0.5);
        animation.advance(2.0);

        assert_eq!(animation.elapsed_time(), 2.0);
        assert_eq!(*seen.borrow(), vec![0.25, 1.0]);
    }

    #[test]
    fn test_advance_does_not_clamp() {
        let seen = recorder();
        let seen_clone = Rc::clone(&seen);
        let animation = Animation::new(
            Action::bounded(BoundedFn::new(1.0, move |t| seen_clone.borrow_mut().push(t))).unwrap(),
        );

        animation.advance(1.5);
        assert_eq!(*seen.borrow(), vec![1.5]);
    }

    #[test]
    fn test_advance_unbounded_passes_elapsed() {
        let seen = recorder();
        let seen_clone = Rc::clone(&seen);
        let animation = Animation::new(Action::unbounded(UnboundedFn::new(move |e| {
            seen_clone.borrow_mut().push(e)
        })));

        animation.advance(42.0);
        assert_eq!(*seen.borrow(), vec![42.0]);
    }

    #[test]
    fn test_on_start_fires_once() {
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let animation = Animation::new(Action::unbounded(
            UnboundedFn::new(|_| {}).on_become_active(move || count_clone.set(count_clone.get() + 1)),
        ));

        animation.on_start();
        animation.on_start();
        assert!(animation.has_started());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_on_finish_forwards() {
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let animation = Animation::new(
            Action::bounded(
                BoundedFn::new(1.0, |_| {})
                    .on_become_inactive(move || count_clone.set(count_clone.get() + 1)),
            )
            .unwrap(),
        );

        animation.on_finish();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_finish_requested_during_update_is_deferred() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Rc<Animation>>>> = Rc::new(RefCell::new(None));

        let (order_update, order_finish) = (Rc::clone(&order), Rc::clone(&order));
        let slot_clone = Rc::clone(&slot);
        let animation = Rc::new(Animation::new(Action::unbounded(
            UnboundedFn::new(move |_| {
                order_update.borrow_mut().push("update");
                if let Some(me) = slot_clone.borrow().as_ref() {
                    me.on_finish();
                }
            })
            .on_become_inactive(move || order_finish.borrow_mut().push("finish")),
        )));
        *slot.borrow_mut() = Some(Rc::clone(&animation));

        animation.advance(0.1);
        assert_eq!(*order.borrow(), vec!["update", "finish"]);

        // Break the cycle
        slot.borrow_mut().take();
    }

    #[test]
    fn test_skipped_nested_advance_keeps_elapsed() {
        let seen = recorder();
        let slot: Rc<RefCell<Option<Rc<Animation>>>> = Rc::new(RefCell::new(None));

        let (seen_clone, slot_clone) = (Rc::clone(&seen), Rc::clone(&slot));
        let animation = Rc::new(Animation::new(Action::unbounded(UnboundedFn::new(
            move |e| {
                seen_clone.borrow_mut().push(e);
                if let Some(me) = slot_clone.borrow().as_ref() {
                    me.advance(99.0);
                }
            },
        ))));
        *slot.borrow_mut() = Some(Rc::clone(&animation));

        animation.advance(0.5);
        assert_eq!(animation.elapsed_time(), 0.5);
        assert_eq!(*seen.borrow(), vec![0.5]);

        slot.borrow_mut().take();
    }
}
