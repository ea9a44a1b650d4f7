//! From/to property transitions.
//!
//! A transition interpolates every property named in `to` from its start
//! value. When no explicit `from` is given, the start values are read from the
//! target on the first tick that gets past the wait and delay gates, so a
//! transition queued behind another one starts wherever the previous one left
//! the node.

use super::animate::{Animate, AnimateOptions, Tick};
use super::types::{Animatable, Pose};

/// Configuration for a [`Transition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionOptions {
    /// Start values; `None` reads them from the target once running.
    pub from: Option<Pose>,
    /// End values. Only these properties are written.
    pub to: Pose,
    pub timing: AnimateOptions,
}

impl TransitionOptions {
    /// Animate from the target's current values to `to`.
    pub fn to(to: Pose, timing: AnimateOptions) -> Self {
        Self {
            from: None,
            to,
            timing,
        }
    }

    /// Animate between two explicit poses.
    pub fn from_to(from: Pose, to: Pose, timing: AnimateOptions) -> Self {
        Self {
            from: Some(from),
            to,
            timing,
        }
    }
}

/// Linear interpolation of a set of properties, shaped by the easing curve.
#[derive(Debug)]
pub struct Transition {
    pub base: Animate,
    from: Option<Pose>,
    to: Pose,
}

impl Transition {
    pub fn new(options: TransitionOptions) -> Self {
        Self {
            base: Animate::new(&options.timing),
            from: options.from,
            to: options.to,
        }
    }

    /// Start values, once known.
    pub fn from(&self) -> Option<&Pose> {
        self.from.as_ref()
    }

    /// Target values.
    pub fn to(&self) -> &Pose {
        &self.to
    }

    /// Advance by `snippet` ms and write the interpolated pose to `target`.
    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        if !self.base.advance(snippet) {
            return Tick::Idle;
        }
        if self.from.is_none() {
            self.from = Some(Pose::capture(target, self.to.props()));
        }
        let pose = self.next_pose();
        pose.apply_to(target);
        self.base.settle(pose)
    }

    fn next_pose(&self) -> Pose {
        let ratio = self.base.eased();
        self.to
            .iter()
            .map(|(prop, to)| {
                let from = self
                    .from
                    .as_ref()
                    .and_then(|f| f.get(prop))
                    .unwrap_or(to);
                (prop, from + (to - from) * ratio)
            })
            .collect()
    }
}
