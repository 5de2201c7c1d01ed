//! Action capability
//!
//! An action is the thing an [`Animation`](crate::animation::Animation) drives.
//! Every action is exactly one of two kinds, fixed when the [`Action`] is built:
//!
//! - **Bounded**: has a fixed duration and receives normalized progress in `[0, 1]`
//! - **Unbounded**: has no duration and receives raw elapsed seconds
//!
//! What an action computes with that time (interpolation, easing, sequencing) is
//! up to the implementor. [`BoundedFn`] and [`UnboundedFn`] cover the common case
//! of driving a closure.

use std::fmt;

use crate::error::{CadenceError, Result};

/// An action with a fixed duration, updated with normalized progress
pub trait BoundedAction {
    /// Duration in seconds. Read once when the action is wrapped in an [`Action`].
    fn duration(&self) -> f64;

    /// Apply progress in `[0, 1]`
    fn update(&mut self, progress: f64);

    /// Called once when the owning animation first becomes active
    fn did_become_active(&mut self) {}

    /// Called when the owning animation is finished or force-removed
    fn did_become_inactive(&mut self) {}
}

/// An action without a duration, updated with elapsed seconds
pub trait UnboundedAction {
    /// Apply the total elapsed time in seconds
    fn update(&mut self, elapsed: f64);

    /// Called once when the owning animation first becomes active
    fn did_become_active(&mut self) {}

    /// Called when the owning animation is force-removed
    fn did_become_inactive(&mut self) {}
}

enum ActionKind {
    Bounded {
        duration: f64,
        action: Box<dyn BoundedAction>,
    },
    Unbounded(Box<dyn UnboundedAction>),
}

/// A bounded or unbounded action, ready to be scheduled
pub struct Action {
    kind: ActionKind,
}

impl Action {
    /// Wrap a bounded action
    ///
    /// Fails with [`CadenceError::InvalidDuration`] unless the duration is finite
    /// and strictly positive.
    pub fn bounded<A>(action: A) -> Result<Self>
    where
        A: BoundedAction + 'static,
    {
        let duration = action.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CadenceError::InvalidDuration(duration));
        }

        Ok(Self {
            kind: ActionKind::Bounded {
                duration,
                action: Box::new(action),
            },
        })
    }

    /// Wrap an unbounded action
    pub fn unbounded<A>(action: A) -> Self
    where
        A: UnboundedAction + 'static,
    {
        Self {
            kind: ActionKind::Unbounded(Box::new(action)),
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self.kind, ActionKind::Bounded { .. })
    }

    /// Duration in seconds, or 0 for unbounded actions
    pub fn duration(&self) -> f64 {
        match &self.kind {
            ActionKind::Bounded { duration, .. } => *duration,
            ActionKind::Unbounded(_) => 0.0,
        }
    }

    /// Feed the action a time value in its own domain
    ///
    /// Bounded actions receive `elapsed / duration`, unbounded actions receive
    /// `elapsed` unchanged. No clamping is applied here.
    pub(crate) fn update(&mut self, elapsed: f64) {
        match &mut self.kind {
            ActionKind::Bounded { duration, action } => action.update(elapsed / *duration),
            ActionKind::Unbounded(action) => action.update(elapsed),
        }
    }

    pub(crate) fn did_become_active(&mut self) {
        match &mut self.kind {
            ActionKind::Bounded { action, .. } => action.did_become_active(),
            ActionKind::Unbounded(action) => action.did_become_active(),
        }
    }

    pub(crate) fn did_become_inactive(&mut self) {
        match &mut self.kind {
            ActionKind::Bounded { action, .. } => action.did_become_inactive(),
            ActionKind::Unbounded(action) => action.did_become_inactive(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::Bounded { duration, .. } => f
                .debug_struct("Action::Bounded")
                .field("duration", duration)
                .finish_non_exhaustive(),
            ActionKind::Unbounded(_) => f.debug_struct("Action::Unbounded").finish_non_exhaustive(),
        }
    }
}

type Hook = Box<dyn FnMut()>;

/// Bounded action driven by a closure receiving progress
///
/// ```ignore
/// let fade = BoundedFn::new(0.3, move |t| opacity.set(1.0 - t))
///     .on_become_inactive(|| tracing::info!("fade done"));
/// let id = scheduler.run(Action::bounded(fade)?);
/// ```
pub struct BoundedFn {
    duration: f64,
    update: Box<dyn FnMut(f64)>,
    on_become_active: Option<Hook>,
    on_become_inactive: Option<Hook>,
}

impl BoundedFn {
    pub fn new<F>(duration: f64, update: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        Self {
            duration,
            update: Box::new(update),
            on_become_active: None,
            on_become_inactive: None,
        }
    }

    /// Register a callback for when the animation first becomes active
    pub fn on_become_active<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_become_active = Some(Box::new(hook));
        self
    }

    /// Register a callback for when the animation becomes inactive
    pub fn on_become_inactive<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_become_inactive = Some(Box::new(hook));
        self
    }
}

impl BoundedAction for BoundedFn {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn update(&mut self, progress: f64) {
        (self.update)(progress);
    }

    fn did_become_active(&mut self) {
        if let Some(hook) = self.on_become_active.as_mut() {
            hook();
        }
    }

    fn did_become_inactive(&mut self) {
        if let Some(hook) = self.on_become_inactive.as_mut() {
            hook();
        }
    }
}

/// Unbounded action driven by a closure receiving elapsed seconds
pub struct UnboundedFn {
    update: Box<dyn FnMut(f64)>,
    on_become_active: Option<Hook>,
    on_become_inactive: Option<Hook>,
}

impl UnboundedFn {
    pub fn new<F>(update: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        Self {
            update: Box::new(update),
            on_become_active: None,
            on_become_inactive: None,
        }
    }

    pub fn on_become_active<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_become_active = Some(Box::new(hook));
        self
    }

    pub fn on_become_inactive<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_become_inactive = Some(Box::new(hook));
        self
    }
}

impl UnboundedAction for UnboundedFn {
    fn update(&mut self, elapsed: f64) {
        (self.update)(elapsed);
    }

    fn did_become_active(&mut self) {
        if let Some(hook) = self.on_become_active.as_mut() {
            hook();
        }
    }

    fn did_become_inactive(&mut self) {
        if let Some(hook) = self.on_become_inactive.as_mut() {
            hook();
        }
    }
}
