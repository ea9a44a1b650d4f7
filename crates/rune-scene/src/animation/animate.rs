//! Shared timing state for every animation kind.
//!
//! `Animate` owns the clock of one animation: progress within the current
//! cycle, direction, the wait and delay gates, and the repeat policy. Each
//! concrete animation embeds one and drives it through the same tick:
//!
//! ```text
//! gate (wait, pause, delay) → advance progress → variant computes pose
//!   → notify(on_update) → cycle end? repeat / alternate / complete
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::easing::EasingFunction;
use super::types::{AnimationState, Pose};

pub type UpdateCallback = Box<dyn FnMut(&Pose, f64)>;
pub type CompleteCallback = Box<dyn FnMut(&Pose)>;

/// Timing options shared by every animation factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimateOptions {
    /// Length of one cycle in ms.
    pub duration: f64,
    /// Gate before every cycle, re-armed on repeat.
    pub delay: f64,
    /// One-off gate before the delay; ignores time scale.
    pub wait: f64,
    /// Extra cycles after the first.
    pub repeats: u32,
    /// Repeat forever; wins over `repeats`.
    pub infinity: bool,
    /// Play every other cycle backwards with the mirrored easing.
    pub alternate: bool,
    pub time_scale: f64,
    pub ease: EasingFunction,
}

impl Default for AnimateOptions {
    fn default() -> Self {
        Self {
            duration: 300.0,
            delay: 0.0,
            wait: 0.0,
            repeats: 0,
            infinity: false,
            alternate: false,
            time_scale: 1.0,
            ease: EasingFunction::EaseBoth,
        }
    }
}

impl AnimateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = ms;
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = ms;
        self
    }

    pub fn wait(mut self, ms: f64) -> Self {
        self.wait = ms;
        self
    }

    pub fn repeats(mut self, count: u32) -> Self {
        self.repeats = count;
        self
    }

    pub fn infinity(mut self, infinity: bool) -> Self {
        self.infinity = infinity;
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    pub fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    pub fn ease(mut self, ease: EasingFunction) -> Self {
        self.ease = ease;
        self
    }

    /// Ease by name; unknown names keep the current ease and log a warning.
    pub fn ease_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(ease) => self.ease = ease,
            Err(err) => tracing::warn!(%err, "keeping {}", self.ease),
        }
        self
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Gated (waiting, delaying, paused) or dead; nothing was applied.
    Idle,
    /// A pose was applied.
    Running,
    /// A cycle ended and another one started.
    Iteration,
    /// The last cycle ended; completion has fired.
    Completed,
}

pub struct Animate {
    pub duration: f64,
    /// Elapsed time within the current cycle, kept in `[0, duration]`.
    pub progress: f64,
    /// `1` forwards, `-1` backwards.
    pub direction: i8,
    /// Distance travelled this cycle regardless of direction; ends the cycle.
    pub total_time: f64,
    pub delay: f64,
    pub delay_cut: f64,
    pub wait: f64,
    pub repeats: u32,
    pub infinity: bool,
    pub alternate: bool,
    pub time_scale: f64,
    pub paused: bool,
    pub living: bool,
    /// Survives completion so a sequence can rewind and replay it.
    pub resident: bool,
    /// Set instead of clearing `living` when a resident animation completes.
    pub finished: bool,
    pub ease: EasingFunction,
    /// Completed cycles.
    pub cycles: u32,
    pose: Pose,
    on_update: Option<UpdateCallback>,
    on_complete: Option<CompleteCallback>,
}

impl fmt::Debug for Animate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animate")
            .field("duration", &self.duration)
            .field("progress", &self.progress)
            .field("direction", &self.direction)
            .field("total_time", &self.total_time)
            .field("delay_cut", &self.delay_cut)
            .field("wait", &self.wait)
            .field("repeats", &self.repeats)
            .field("infinity", &self.infinity)
            .field("alternate", &self.alternate)
            .field("paused", &self.paused)
            .field("living", &self.living)
            .field("ease", &self.ease)
            .finish_non_exhaustive()
    }
}

impl Animate {
    pub fn new(options: &AnimateOptions) -> Self {
        Self {
            duration: options.duration.max(0.0),
            progress: 0.0,
            direction: 1,
            total_time: 0.0,
            delay: options.delay,
            delay_cut: options.delay,
            wait: options.wait,
            repeats: options.repeats,
            infinity: options.infinity,
            alternate: options.alternate,
            time_scale: options.time_scale,
            paused: false,
            living: true,
            resident: false,
            finished: false,
            ease: options.ease.clone(),
            cycles: 0,
            pose: Pose::new(),
            on_update: None,
            on_complete: None,
        }
    }

    /// Progress as a fraction of the cycle; a zero-length cycle counts as done.
    pub fn ratio(&self) -> f64 {
        if self.duration > 0.0 {
            self.progress / self.duration
        } else {
            1.0
        }
    }

    /// Eased ratio for the current progress.
    pub fn eased(&self) -> f64 {
        self.ease.evaluate(self.ratio())
    }

    /// Last pose reported through `notify`.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn state(&self) -> AnimationState {
        if !self.living {
            AnimationState::Dead
        } else if self.finished {
            AnimationState::Finished
        } else if self.wait > 0.0 {
            AnimationState::Waiting
        } else if self.paused {
            AnimationState::Paused
        } else if self.delay_cut > 0.0 {
            AnimationState::Delaying
        } else {
            AnimationState::Running
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn start(&mut self) {
        self.paused = false;
    }

    /// Fast-forward to the end of the cycle; the next tick completes it.
    pub fn stop(&mut self) {
        self.progress = self.duration;
        self.total_time = self.total_time.max(self.duration);
    }

    /// Kill without firing completion.
    pub fn cancel(&mut self) {
        self.living = false;
    }

    pub fn set_on_update(&mut self, callback: UpdateCallback) {
        self.on_update = Some(callback);
    }

    pub fn set_on_complete(&mut self, callback: CompleteCallback) {
        self.on_complete = Some(callback);
    }

    /// Wait, pause and delay gates. Returns false when the tick must not
    /// produce a pose.
    ///
    /// The delay drains whenever this branch is reached, including while
    /// paused.
    pub(crate) fn gate(&mut self, snippet: f64) -> bool {
        if self.wait > 0.0 {
            self.wait -= snippet.abs();
            return false;
        }
        if self.paused || !self.living || self.finished || self.delay_cut > 0.0 {
            if self.delay_cut > 0.0 {
                self.delay_cut -= snippet.abs();
            }
            return false;
        }
        true
    }

    /// Gate, then move progress by the scaled, signed snippet.
    pub(crate) fn advance(&mut self, snippet: f64) -> bool {
        if !self.gate(snippet) {
            return false;
        }
        let step = f64::from(self.direction) * self.time_scale * snippet;
        self.progress = (self.progress + step).clamp(0.0, self.duration);
        self.total_time += step.abs();
        true
    }

    pub(crate) fn notify(&mut self, pose: Pose, ratio: f64) {
        if let Some(callback) = self.on_update.as_mut() {
            callback(&pose, ratio);
        }
        self.pose = pose;
    }

    /// Consume one repeat if the policy allows another cycle, re-arming the
    /// delay. Infinity wins over a finite count.
    pub(crate) fn take_repeat(&mut self) -> bool {
        if self.infinity {
            // repeats stays untouched
        } else if self.repeats > 0 {
            self.repeats -= 1;
        } else {
            return false;
        }
        self.cycles += 1;
        self.delay_cut = self.delay;
        self.total_time = 0.0;
        true
    }

    /// Terminal completion; fires `on_complete` once.
    pub(crate) fn complete(&mut self) -> Tick {
        if self.resident {
            self.finished = true;
        } else {
            self.living = false;
        }
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&self.pose);
        }
        Tick::Completed
    }

    /// Report the pose, then end the cycle if the distance travelled covers
    /// the duration.
    pub(crate) fn settle(&mut self, pose: Pose) -> Tick {
        let ratio = self.ratio();
        self.notify(pose, ratio);

        if self.total_time < self.duration {
            return Tick::Running;
        }
        if self.take_repeat() {
            if self.alternate {
                self.direction = -self.direction;
                self.ease = self.ease.mirrored();
            } else {
                self.direction = 1;
                self.progress = 0.0;
            }
            Tick::Iteration
        } else {
            self.complete()
        }
    }

    /// Reset for a replay starting at `progress` in `direction`.
    pub(crate) fn rewind(&mut self, progress: f64, direction: i8) {
        self.progress = progress.clamp(0.0, self.duration);
        self.direction = direction;
        self.total_time = 0.0;
        self.delay_cut = self.delay;
        self.finished = false;
        self.living = true;
    }

    /// Distance travelled past the end of the cycle, in unscaled ms.
    pub(crate) fn overflow(&self) -> f64 {
        let over = (self.total_time - self.duration).max(0.0);
        if self.time_scale != 0.0 {
            over / self.time_scale.abs()
        } else {
            0.0
        }
    }
}
