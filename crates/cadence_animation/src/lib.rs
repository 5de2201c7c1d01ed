//! Cadence Animation
//!
//! Frame-driven scheduling of time-based actions.
//!
//! # Features
//!
//! - **Bounded actions**: fixed duration, updated with normalized progress, removed automatically when done
//! - **Unbounded actions**: updated with raw elapsed seconds, run until removed
//! - **Pause/Resume**: park every animation and stop the clock without losing elapsed time
//! - **Re-entrant hooks**: actions may add, remove, pause, or resume through a `SchedulerHandle` mid-step
//! - **Pluggable clocks**: `FrameClock` trait with a host-driven `ManualClock` and a paced `IntervalClock`

pub mod action;
pub mod animation;
pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;

pub use action::{Action, BoundedAction, BoundedFn, UnboundedAction, UnboundedFn};
pub use animation::Animation;
pub use clock::{ClockSubscription, FrameClock, IntervalClock, ManualClock, TickCallback};
pub use config::ClockConfig;
pub use error::{CadenceError, Result};
pub use scheduler::{ActionScheduler, AnimationId, SchedulerHandle};
