//! Sequencing of heterogeneous sub-animations.
//!
//! A runner walks a list of steps one at a time. Each step is instantiated
//! the first time the cursor reaches it and kept resident afterwards, so a
//! repeating or alternating sequence rewinds the same legs instead of
//! rebuilding them. Time left over when a leg finishes mid-tick is handed to
//! the next leg in the same tick.

use super::animate::{Animate, AnimateOptions, Tick};
use super::path_motion::{MotionOptions, PathMotion};
use super::transition::{Transition, TransitionOptions};
use super::types::Animatable;

/// Declarative step of a runner.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerStep {
    Transition(TransitionOptions),
    Motion(MotionOptions),
}

impl From<TransitionOptions> for RunnerStep {
    fn from(options: TransitionOptions) -> Self {
        RunnerStep::Transition(options)
    }
}

impl From<MotionOptions> for RunnerStep {
    fn from(options: MotionOptions) -> Self {
        RunnerStep::Motion(options)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerOptions {
    pub steps: Vec<RunnerStep>,
    /// Sequence-level timing; `duration` and `ease` are ignored.
    pub timing: AnimateOptions,
}

impl RunnerOptions {
    pub fn new(timing: AnimateOptions) -> Self {
        Self {
            steps: Vec::new(),
            timing,
        }
    }

    pub fn then(mut self, step: impl Into<RunnerStep>) -> Self {
        self.steps.push(step.into());
        self
    }
}

#[derive(Debug)]
enum Leg {
    Transition(Transition),
    Motion(PathMotion),
}

impl Leg {
    fn build(step: &RunnerStep) -> Self {
        let mut leg = match step {
            RunnerStep::Transition(options) => Leg::Transition(Transition::new(options.clone())),
            RunnerStep::Motion(options) => Leg::Motion(PathMotion::new(options.clone())),
        };
        leg.base_mut().resident = true;
        leg
    }

    fn base(&self) -> &Animate {
        match self {
            Leg::Transition(t) => &t.base,
            Leg::Motion(m) => &m.base,
        }
    }

    fn base_mut(&mut self) -> &mut Animate {
        match self {
            Leg::Transition(t) => &mut t.base,
            Leg::Motion(m) => &mut m.base,
        }
    }

    fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        match self {
            Leg::Transition(t) => t.update(snippet, target),
            Leg::Motion(m) => m.update(snippet, target),
        }
    }

    fn rewind(&mut self, direction: i8) {
        let base = self.base_mut();
        let start = if direction < 0 { base.duration } else { 0.0 };
        base.rewind(start, direction);
    }
}

#[derive(Debug)]
pub struct AnimateRunner {
    pub base: Animate,
    steps: Vec<RunnerStep>,
    legs: Vec<Option<Leg>>,
    cursor: usize,
}

impl AnimateRunner {
    pub fn new(options: RunnerOptions) -> Self {
        let mut base = Animate::new(&options.timing);
        if options.steps.is_empty() {
            tracing::warn!("runner has no steps; animation discarded");
            base.living = false;
        }
        let legs = options.steps.iter().map(|_| None).collect();
        Self {
            base,
            steps: options.steps,
            legs,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps instantiated so far.
    pub fn built(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_some()).count()
    }

    fn leg_mut(&mut self, index: usize) -> &mut Leg {
        let direction = self.base.direction;
        let step = &self.steps[index];
        self.legs[index].get_or_insert_with(|| {
            let mut leg = Leg::build(step);
            if direction < 0 {
                leg.rewind(-1);
            }
            leg
        })
    }

    fn rewind_all(&mut self, direction: i8) {
        for leg in self.legs.iter_mut().flatten() {
            leg.rewind(direction);
        }
    }

    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        if !self.base.gate(snippet) {
            return Tick::Idle;
        }
        let len = self.steps.len();
        let mut remaining = (self.base.time_scale * snippet).abs();
        let mut tick = Tick::Running;

        // Every leg can finish at most once per pass; the bound only guards
        // against zero-length sequences spinning.
        for _ in 0..(len * 2 + 2) {
            let index = self.cursor;
            let leg = self.leg_mut(index);
            leg.update(remaining, target);

            let base = leg.base();
            let finished = base.finished;
            let overflow = base.overflow();
            let ratio = (index as f64 + base.ratio()) / len as f64;
            let pose = base.pose().clone();
            self.base.notify(pose, ratio);

            if !finished {
                break;
            }
            remaining = overflow;

            let next = index as isize + isize::from(self.base.direction);
            if next >= 0 && (next as usize) < len {
                self.cursor = next as usize;
                if remaining <= 0.0 {
                    break;
                }
                continue;
            }

            // End of the sequence.
            if !self.base.take_repeat() {
                tracing::debug!(steps = len, "runner completed");
                return self.base.complete();
            }
            tick = Tick::Iteration;
            if self.base.alternate {
                self.base.direction = -self.base.direction;
                self.cursor = if self.base.direction < 0 { len - 1 } else { 0 };
            } else {
                self.base.direction = 1;
                self.cursor = 0;
            }
            let direction = self.base.direction;
            self.rewind_all(direction);
            if self.base.delay_cut > 0.0 || remaining <= 0.0 {
                break;
            }
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::bezier::BezierCurve;
    use crate::animation::easing::EasingFunction;
    use crate::animation::types::{Pose, Prop};
    use engine_core::Point;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[derive(Default)]
    struct Probe {
        x: f64,
        y: f64,
    }

    impl Animatable for Probe {
        fn get_prop(&self, prop: Prop) -> f64 {
            match prop {
                Prop::X => self.x,
                Prop::Y => self.y,
                _ => 0.0,
            }
        }

        fn set_prop(&mut self, prop: Prop, value: f64) {
            match prop {
                Prop::X => self.x = value,
                Prop::Y => self.y = value,
                _ => {}
            }
        }
    }

    fn linear(duration: f64) -> AnimateOptions {
        AnimateOptions::new()
            .duration(duration)
            .ease(EasingFunction::Linear)
    }

    fn move_x(to: f64) -> TransitionOptions {
        TransitionOptions::to(Pose::new().with(Prop::X, to), linear(100.0))
    }

    #[test]
    fn test_runs_steps_in_sequence_with_overflow() {
        let mut probe = Probe::default();
        let mut runner = AnimateRunner::new(
            RunnerOptions::new(AnimateOptions::new())
                .then(move_x(100.0))
                .then(move_x(200.0)),
        );
        assert_eq!(runner.built(), 0);

        runner.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 50.0));
        assert_eq!(runner.built(), 1);

        // 50 ms finish the first leg, 50 ms carry into the second.
        runner.update(100.0, &mut probe);
        assert_eq!(runner.cursor(), 1);
        assert!(approx_eq(probe.x, 150.0));

        assert_eq!(runner.update(50.0, &mut probe), Tick::Completed);
        assert!(approx_eq(probe.x, 200.0));
        assert!(!runner.base.living);
    }

    #[test]
    fn test_mixed_motion_and_transition() {
        let mut probe = Probe::default();
        let path = BezierCurve::new(vec![Point::new(0.0, 0.0), Point::new(0.0, 80.0)]);
        let mut runner = AnimateRunner::new(
            RunnerOptions::new(AnimateOptions::new())
                .then(MotionOptions::new(path, linear(100.0)))
                .then(move_x(40.0)),
        );
        runner.update(100.0, &mut probe);
        assert!(approx_eq(probe.y, 80.0));
        runner.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 20.0));
        assert!(approx_eq(probe.y, 80.0));
    }

    #[test]
    fn test_alternate_plays_sequence_backwards() {
        let mut probe = Probe::default();
        let mut runner = AnimateRunner::new(
            RunnerOptions::new(AnimateOptions::new().alternate(true).repeats(1))
                .then(move_x(100.0))
                .then(move_x(200.0)),
        );
        runner.update(100.0, &mut probe);
        assert_eq!(runner.update(100.0, &mut probe), Tick::Iteration);
        assert!(approx_eq(probe.x, 200.0));
        assert_eq!(runner.base.direction, -1);
        assert_eq!(runner.cursor(), 1);

        runner.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 150.0));
        runner.update(50.0, &mut probe);
        assert_eq!(runner.cursor(), 0);
        assert_eq!(runner.update(100.0, &mut probe), Tick::Completed);
        assert!(approx_eq(probe.x, 0.0));
    }

    #[test]
    fn test_repeat_restarts_from_first_leg() {
        let mut probe = Probe::default();
        let mut runner = AnimateRunner::new(
            RunnerOptions::new(AnimateOptions::new().repeats(1))
                .then(TransitionOptions::from_to(
                    Pose::new().with(Prop::X, 0.0),
                    Pose::new().with(Prop::X, 100.0),
                    linear(100.0),
                ))
                .then(move_x(200.0)),
        );
        runner.update(100.0, &mut probe);
        assert_eq!(runner.update(100.0, &mut probe), Tick::Iteration);
        assert_eq!(runner.cursor(), 0);
        runner.update(25.0, &mut probe);
        assert!(approx_eq(probe.x, 25.0));
        assert_eq!(runner.built(), 2);
    }

    #[test]
    fn test_empty_runner_is_dead() {
        let mut probe = Probe::default();
        let mut runner = AnimateRunner::new(RunnerOptions::default());
        assert!(runner.is_empty());
        assert_eq!(runner.update(16.0, &mut probe), Tick::Idle);
    }
}
