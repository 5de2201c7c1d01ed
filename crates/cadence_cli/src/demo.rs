//! Demo actions driven by the CLI

use std::cell::Cell;
use std::rc::Rc;

use cadence_animation::{Action, AnimationId, BoundedAction, SchedulerHandle, UnboundedAction};
use tracing::{debug, info};

/// A named bounded action that publishes its latest progress
pub struct Tween {
    name: String,
    duration: f64,
    progress: Rc<Cell<f64>>,
}

impl Tween {
    pub fn new(name: impl Into<String>, duration: f64) -> (Self, Rc<Cell<f64>>) {
        let progress = Rc::new(Cell::new(0.0));
        let tween = Self {
            name: name.into(),
            duration,
            progress: Rc::clone(&progress),
        };
        (tween, progress)
    }
}

impl BoundedAction for Tween {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn update(&mut self, progress: f64) {
        debug!("{}: progress {:.3}", self.name, progress);
        self.progress.set(progress);
    }

    fn did_become_active(&mut self) {
        info!("{}: started ({:.2}s)", self.name, self.duration);
    }

    fn did_become_inactive(&mut self) {
        info!("{}: finished at {:.3}", self.name, self.progress.get());
    }
}

/// An unbounded action that removes itself once `stop_after` seconds have elapsed
pub struct Spinner {
    stop_after: f64,
    scheduler: SchedulerHandle,
    id: Rc<Cell<Option<AnimationId>>>,
    frames: u64,
}

impl Spinner {
    /// Register a spinner with the scheduler behind `scheduler`
    pub fn spawn(scheduler: SchedulerHandle, stop_after: f64) -> Option<AnimationId> {
        let id = Rc::new(Cell::new(None));
        let spinner = Self {
            stop_after,
            scheduler: scheduler.clone(),
            id: Rc::clone(&id),
            frames: 0,
        };
        let spawned = scheduler.run(Action::unbounded(spinner));
        id.set(spawned);
        spawned
    }
}

impl UnboundedAction for Spinner {
    fn update(&mut self, elapsed: f64) {
        self.frames += 1;
        if elapsed >= self.stop_after {
            if let Some(id) = self.id.get() {
                debug!("spinner: stopping after {:.3}s", elapsed);
                self.scheduler.remove(id, true);
            }
        }
    }

    fn did_become_inactive(&mut self) {
        info!("spinner: stopped after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_animation::ActionScheduler;

    #[test]
    fn test_tween_publishes_progress() {
        let scheduler = ActionScheduler::new();
        let (tween, progress) = Tween::new("fade", 2.0);
        scheduler.run(Action::bounded(tween).unwrap());

        scheduler.step(0.5);
        assert_eq!(progress.get(), 0.25);

        scheduler.step(5.0);
        assert_eq!(progress.get(), 1.0);
        assert_eq!(scheduler.num_running_animations(), 0);
    }

    #[test]
    fn test_spinner_removes_itself() {
        let scheduler = ActionScheduler::new();
        let id = Spinner::spawn(scheduler.handle(), 1.0).unwrap();

        scheduler.step(0.5);
        assert!(scheduler.contains(id));

        scheduler.step(0.5);
        assert!(!scheduler.contains(id));
        assert_eq!(scheduler.num_running_animations(), 0);
    }
}
