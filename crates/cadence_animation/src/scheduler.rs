//! Action scheduler
//!
//! Owns every registered [`Animation`], advances the active ones by the time
//! elapsed between frame clock ticks, and removes bounded animations once their
//! duration has elapsed.
//!
//! The scheduler is single-threaded and re-entrant: action hooks may call back
//! into it through a [`SchedulerHandle`] while a step is in progress. A step
//! iterates a snapshot of the active animations and applies removals in a
//! second pass, so additions made by a hook are first advanced on the next tick.
//!
//! ```ignore
//! use cadence_animation::{Action, ActionScheduler, BoundedFn, ManualClock};
//!
//! let clock = ManualClock::new();
//! let scheduler = ActionScheduler::with_clock(clock.clone());
//! let id = scheduler.run(Action::bounded(BoundedFn::new(0.25, |t| println!("{t}")))?);
//!
//! clock.tick(0.000); // baseline
//! clock.tick(0.016); // progress 0.064
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::action::Action;
use crate::animation::Animation;
use crate::clock::{ClockSubscription, FrameClock, ManualClock};

new_key_type! {
    /// Handle to an animation registered with a scheduler
    pub struct AnimationId;
}

type Snapshot = SmallVec<[(AnimationId, Rc<Animation>); 16]>;

/// Internal state of the scheduler
struct SchedulerInner {
    animations: SlotMap<AnimationId, Rc<Animation>>,
    /// Running animations, in insertion order
    active: Vec<AnimationId>,
    /// Animations parked by `pause()` or added while paused
    paused: Vec<AnimationId>,
    is_paused: bool,
    clock: Box<dyn FrameClock>,
    subscription: Option<ClockSubscription>,
    last_timestamp: Option<f64>,
}

impl SchedulerInner {
    /// Nothing is parked unless paused, so a registered id is active iff unpaused
    fn is_active(&self, id: AnimationId) -> bool {
        !self.is_paused && self.animations.contains_key(id)
    }

    /// Subscribe to the clock unless already subscribed
    fn start_clock(&mut self, shared: Weak<RefCell<SchedulerInner>>) {
        if self.subscription.is_some() {
            return;
        }

        // The first tick of a new subscription only records a baseline
        self.last_timestamp = None;
        self.subscription = Some(self.clock.start(Box::new(move |timestamp| {
            if let Some(shared) = shared.upgrade() {
                on_tick(&shared, timestamp);
            }
        })));
        tracing::debug!("ActionScheduler: clock started");
    }

    fn stop_clock(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.clock.invalidate(subscription);
            tracing::debug!("ActionScheduler: clock stopped");
        }
    }
}

// ============================================================================
// Scheduler operations
// ============================================================================
//
// Shared by `ActionScheduler` and `SchedulerHandle`. None of these hold the
// `RefCell` borrow while an action hook runs.

fn on_tick(shared: &Rc<RefCell<SchedulerInner>>, timestamp: f64) {
    let dt = {
        let mut inner = shared.borrow_mut();
        if inner.subscription.is_none() {
            return;
        }
        let last = inner.last_timestamp.replace(timestamp);
        match last {
            Some(last) => timestamp - last,
            None => return,
        }
    };

    step(shared, dt);
}

fn add(shared: &Rc<RefCell<SchedulerInner>>, animation: Animation) -> AnimationId {
    let animation = Rc::new(animation);

    let id = {
        let mut inner = shared.borrow_mut();
        let id = inner.animations.insert(Rc::clone(&animation));
        if inner.is_paused {
            inner.paused.push(id);
            tracing::trace!("ActionScheduler: queued {:?} while paused", id);
            return id;
        }
        inner.active.push(id);
        id
    };

    animation.on_start();

    // A start hook may have paused, removed, or otherwise changed the state
    let mut inner = shared.borrow_mut();
    if !inner.active.is_empty() && !inner.is_paused {
        inner.start_clock(Rc::downgrade(shared));
    }
    id
}

fn remove(shared: &Rc<RefCell<SchedulerInner>>, id: AnimationId, force_finish: bool) {
    let animation = {
        let mut inner = shared.borrow_mut();
        if let Some(index) = inner.active.iter().position(|a| *a == id) {
            inner.active.remove(index);
            if inner.active.is_empty() {
                inner.stop_clock();
            }
        } else if inner.is_paused {
            match inner.paused.iter().position(|a| *a == id) {
                Some(index) => {
                    inner.paused.remove(index);
                }
                None => return,
            }
        } else {
            return;
        }
        inner.animations.remove(id)
    };

    // Excised before the hook so it observes the animation as gone
    if let Some(animation) = animation {
        if force_finish {
            animation.on_finish();
        }
    }
}

fn remove_all(shared: &Rc<RefCell<SchedulerInner>>) {
    let running = shared.borrow().active.clone();
    for id in running {
        remove(shared, id, true);
    }

    // Paused animations are dropped without a finish hook, after the borrow
    // ends so an action's destructor can still reach the scheduler
    let mut dropped: Vec<Rc<Animation>> = Vec::new();
    {
        let mut inner = shared.borrow_mut();
        let paused = std::mem::take(&mut inner.paused);
        for id in paused {
            dropped.extend(inner.animations.remove(id));
        }
    }
    drop(dropped);
}

fn pause(shared: &Rc<RefCell<SchedulerInner>>) {
    let mut inner = shared.borrow_mut();
    if inner.is_paused {
        return;
    }

    inner.is_paused = true;
    let active = std::mem::take(&mut inner.active);
    inner.paused.extend(active);
    inner.stop_clock();
    tracing::debug!("ActionScheduler: paused ({} animations)", inner.paused.len());
}

fn resume(shared: &Rc<RefCell<SchedulerInner>>) {
    let unstarted: Vec<Rc<Animation>> = {
        let mut inner = shared.borrow_mut();
        if !inner.is_paused {
            return;
        }

        inner.is_paused = false;
        let paused = std::mem::take(&mut inner.paused);
        inner.active.extend(paused);
        tracing::debug!("ActionScheduler: resumed ({} animations)", inner.active.len());

        inner
            .active
            .iter()
            .filter_map(|id| inner.animations.get(*id))
            .filter(|animation| !animation.has_started())
            .cloned()
            .collect()
    };

    for animation in unstarted {
        animation.on_start();
    }

    let mut inner = shared.borrow_mut();
    if !inner.active.is_empty() && !inner.is_paused {
        inner.start_clock(Rc::downgrade(shared));
    }
}

fn step(shared: &Rc<RefCell<SchedulerInner>>, dt: f64) {
    let snapshot: Snapshot = {
        let inner = shared.borrow();
        inner
            .active
            .iter()
            .filter_map(|id| inner.animations.get(*id).map(|a| (*id, Rc::clone(a))))
            .collect()
    };

    tracing::trace!("ActionScheduler: step dt={:.4}s ({} animations)", dt, snapshot.len());

    let mut pending_removal: SmallVec<[AnimationId; 8]> = SmallVec::new();

    for (id, animation) in &snapshot {
        // Skip anything an earlier hook in this pass removed or paused
        if !shared.borrow().is_active(*id) {
            continue;
        }

        let prospective = animation.elapsed_time() + dt;
        if animation.has_duration() {
            let duration = animation.duration();
            if prospective >= duration {
                pending_removal.push(*id);
                animation.advance(duration);
            } else {
                animation.advance(prospective);
            }
        } else {
            animation.advance(prospective);
        }
    }

    for id in pending_removal {
        remove(shared, id, true);
    }
}

// ============================================================================
// ActionScheduler
// ============================================================================

/// Drives registered actions from a frame clock
///
/// The scheduler owns its clock. It subscribes when the first animation
/// becomes active and unsubscribes when the last one is removed or the
/// scheduler is paused. Hooks that need to reach the scheduler should hold a
/// [`SchedulerHandle`].
pub struct ActionScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl ActionScheduler {
    /// Create a scheduler that is only advanced by calling [`step`](Self::step)
    pub fn new() -> Self {
        Self::with_clock(ManualClock::new())
    }

    /// Create a scheduler driven by `clock`
    pub fn with_clock<C>(clock: C) -> Self
    where
        C: FrameClock + 'static,
    {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                animations: SlotMap::with_key(),
                active: Vec::new(),
                paused: Vec::new(),
                is_paused: false,
                clock: Box::new(clock),
                subscription: None,
                last_timestamp: None,
            })),
        }
    }

    /// Get a weak handle to this scheduler for passing to actions and components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Wrap `action` in a new animation and add it
    ///
    /// Keep the returned id to remove the animation before it finishes.
    pub fn run(&self, action: Action) -> AnimationId {
        self.add(Animation::new(action))
    }

    /// Register an animation
    ///
    /// While paused the animation is parked and its start hook deferred until
    /// [`resume`](Self::resume). Otherwise it starts immediately.
    pub fn add(&self, animation: Animation) -> AnimationId {
        add(&self.inner, animation)
    }

    /// Remove an animation, firing its finish hook when `force_finish` is set
    ///
    /// Unknown or already-removed ids are ignored.
    pub fn remove(&self, id: AnimationId, force_finish: bool) {
        remove(&self.inner, id, force_finish);
    }

    /// Force-finish every running animation and drop every paused one
    pub fn remove_all(&self) {
        remove_all(&self.inner);
    }

    /// Park all running animations and stop the clock
    pub fn pause(&self) {
        pause(&self.inner);
    }

    /// Restart everything parked by [`pause`](Self::pause)
    pub fn resume(&self) {
        resume(&self.inner);
    }

    /// Advance every running animation by `dt` seconds
    ///
    /// This is what each clock tick calls; hosts and tests can call it
    /// directly to drive time deterministically.
    pub fn step(&self, dt: f64) {
        step(&self.inner, dt);
    }

    /// Number of running animations (paused ones are not counted)
    pub fn num_running_animations(&self) -> usize {
        self.inner.borrow().active.len()
    }

    /// Number of animations parked while paused
    pub fn num_paused_animations(&self) -> usize {
        self.inner.borrow().paused.len()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().is_paused
    }

    /// Check if the scheduler currently holds a clock subscription
    pub fn is_clock_running(&self) -> bool {
        self.inner.borrow().subscription.is_some()
    }

    /// Check if `id` is registered (running or paused)
    pub fn contains(&self, id: AnimationId) -> bool {
        self.inner.borrow().animations.contains_key(id)
    }

    /// Elapsed time of a registered animation
    pub fn elapsed_time(&self, id: AnimationId) -> Option<f64> {
        self.inner
            .borrow()
            .animations
            .get(id)
            .map(|a| a.elapsed_time())
    }
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ActionScheduler")
            .field("active", &inner.active.len())
            .field("paused", &inner.paused.len())
            .field("is_paused", &inner.is_paused)
            .field("clock_running", &inner.subscription.is_some())
            .finish()
    }
}

impl Drop for ActionScheduler {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.stop_clock();
        }
    }
}

// ============================================================================
// SchedulerHandle
// ============================================================================

/// A weak handle to an [`ActionScheduler`]
///
/// Actions capture this to add, remove, pause, or resume animations from
/// inside their hooks. It won't keep the scheduler alive; once the scheduler
/// is dropped every operation is a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn run(&self, action: Action) -> Option<AnimationId> {
        self.add(Animation::new(action))
    }

    pub fn add(&self, animation: Animation) -> Option<AnimationId> {
        self.inner.upgrade().map(|inner| add(&inner, animation))
    }

    pub fn remove(&self, id: AnimationId, force_finish: bool) {
        if let Some(inner) = self.inner.upgrade() {
            remove(&inner, id, force_finish);
        }
    }

    pub fn remove_all(&self) {
        if let Some(inner) = self.inner.upgrade() {
            remove_all(&inner);
        }
    }

    pub fn pause(&self) {
        if let Some(inner) = self.inner.upgrade() {
            pause(&inner);
        }
    }

    pub fn resume(&self) {
        if let Some(inner) = self.inner.upgrade() {
            resume(&inner);
        }
    }

    pub fn step(&self, dt: f64) {
        if let Some(inner) = self.inner.upgrade() {
            step(&inner, dt);
        }
    }

    pub fn num_running_animations(&self) -> usize {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().active.len())
            .unwrap_or(0)
    }

    pub fn is_paused(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().is_paused)
            .unwrap_or(false)
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
