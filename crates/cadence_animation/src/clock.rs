//! Frame clocks
//!
//! A [`FrameClock`] delivers monotonic timestamps (in seconds) to a single
//! subscriber until that subscription is invalidated. The scheduler starts a
//! subscription when it has work and invalidates it when it runs dry or is
//! paused, so clocks only tick while something is animating.
//!
//! Two clocks ship with the crate:
//!
//! - [`ManualClock`] - the host delivers timestamps itself, e.g. from a window
//!   redraw callback or a test
//! - [`IntervalClock`] - paces ticks on the calling thread at a fixed rate

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ClockConfig;

/// Callback receiving one timestamp per tick
pub type TickCallback = Box<dyn FnMut(f64)>;

/// Identifies one start/invalidate cycle of a clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockSubscription(u64);

/// A periodic timestamp source
///
/// Implementations must not invoke `on_tick` from inside `start`, and must
/// treat `invalidate` of a stale or unknown subscription as a no-op.
pub trait FrameClock {
    /// Begin delivering ticks to `on_tick`, replacing any previous subscriber
    fn start(&mut self, on_tick: TickCallback) -> ClockSubscription;

    /// Stop delivering ticks for `subscription`
    fn invalidate(&mut self, subscription: ClockSubscription);
}

/// Single-subscriber slot shared by the bundled clocks
#[derive(Default)]
struct Subscriber {
    next_id: u64,
    /// The callback is taken out while it runs so it can restart or
    /// invalidate the clock without aliasing this slot.
    current: Option<(ClockSubscription, Option<TickCallback>)>,
}

impl Subscriber {
    fn subscribe(&mut self, on_tick: TickCallback) -> ClockSubscription {
        let subscription = ClockSubscription(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.current = Some((subscription, Some(on_tick)));
        subscription
    }

    fn invalidate(&mut self, subscription: ClockSubscription) {
        if matches!(self.current, Some((current, _)) if current == subscription) {
            self.current = None;
        }
    }

    fn is_live(&self) -> bool {
        self.current.is_some()
    }
}

/// Deliver one timestamp, returning false if nobody was listening
fn deliver(state: &RefCell<Subscriber>, timestamp: f64) -> bool {
    let (subscription, mut on_tick) = {
        let mut state = state.borrow_mut();
        match state.current.as_mut() {
            Some((subscription, slot)) => match slot.take() {
                Some(on_tick) => (*subscription, on_tick),
                // Nested tick from inside the callback
                None => return false,
            },
            None => return false,
        }
    };

    on_tick(timestamp);

    // Put the callback back unless the subscription changed while it ran
    let mut state = state.borrow_mut();
    if let Some((current, slot)) = state.current.as_mut() {
        if *current == subscription && slot.is_none() {
            *slot = Some(on_tick);
        }
    }
    true
}

/// A clock the host ticks by hand
///
/// Clones share the same subscription, so the host can keep one clone while
/// the scheduler owns another.
///
/// ```ignore
/// let clock = ManualClock::new();
/// let scheduler = ActionScheduler::with_clock(clock.clone());
/// scheduler.run(action);
///
/// // From the host's frame callback:
/// clock.tick(frame_timestamp_secs);
/// ```
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<Subscriber>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `timestamp` (seconds) to the current subscriber
    ///
    /// Returns false when no subscription is live.
    pub fn tick(&self, timestamp: f64) -> bool {
        deliver(&self.state, timestamp)
    }

    /// Check if a subscription is live
    pub fn is_running(&self) -> bool {
        self.state.borrow().is_live()
    }
}

impl FrameClock for ManualClock {
    fn start(&mut self, on_tick: TickCallback) -> ClockSubscription {
        self.state.borrow_mut().subscribe(on_tick)
    }

    fn invalidate(&mut self, subscription: ClockSubscription) {
        self.state.borrow_mut().invalidate(subscription);
    }
}

/// A clock that paces its own ticks at `target_fps` on the calling thread
///
/// Nothing happens until [`IntervalClock::run`] is called; it then blocks,
/// ticking once per frame interval, until the subscription is invalidated
/// (for a scheduler: until no animation is active) or the limit elapses.
#[derive(Clone)]
pub struct IntervalClock {
    config: ClockConfig,
    origin: Instant,
    state: Rc<RefCell<Subscriber>>,
}

impl IntervalClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            origin: Instant::now(),
            state: Rc::new(RefCell::new(Subscriber::default())),
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Check if a subscription is live
    pub fn is_running(&self) -> bool {
        self.state.borrow().is_live()
    }

    /// Tick until the subscription ends or `limit` elapses
    ///
    /// Timestamps are seconds since the clock was created. Returns the number
    /// of ticks delivered.
    pub fn run(&self, limit: Option<Duration>) -> u64 {
        let frame_duration = self.config.frame_interval();
        let run_start = Instant::now();
        let mut ticks = 0u64;

        tracing::debug!(
            "IntervalClock: running at {}fps (limit={:?})",
            self.config.target_fps,
            limit
        );

        while self.is_running() {
            if limit.is_some_and(|limit| run_start.elapsed() >= limit) {
                break;
            }

            let frame_start = Instant::now();
            if deliver(&self.state, self.origin.elapsed().as_secs_f64()) {
                ticks += 1;
            }

            // Sleep for remaining frame time
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }

        tracing::debug!("IntervalClock: stopped after {} ticks", ticks);
        ticks
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl FrameClock for IntervalClock {
    fn start(&mut self, on_tick: TickCallback) -> ClockSubscription {
        self.state.borrow_mut().subscribe(on_tick)
    }

    fn invalidate(&mut self, subscription: ClockSubscription) {
        self.state.borrow_mut().invalidate(subscription);
    }
}
