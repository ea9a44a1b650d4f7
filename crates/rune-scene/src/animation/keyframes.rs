//! Multi-segment keyframe animations.
//!
//! A list of poses is walked segment by segment. Each segment may override the
//! animation's ease and duration. A pass ends when the cursor runs off either
//! end of the list; the repeat policy then either starts another pass (from
//! index 0, or back the way it came when alternating) or completes.
//!
//! ```text
//! keys:     K0 ──seg0── K1 ──seg1── K2
//! forward:  key_index 0 → 1, cursor +1
//! reverse:  key_index 2 → 1, cursor -1 (uses seg1 config, mirrored ease)
//! ```

use serde::{Deserialize, Serialize};

use super::animate::{Animate, AnimateOptions, Tick};
use super::easing::EasingFunction;
use super::types::{Animatable, Pose};

/// Per-segment override; `None` falls back to the animation's timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub ease: Option<EasingFunction>,
    pub duration: Option<f64>,
}

impl KeyConfig {
    pub fn new(ease: Option<EasingFunction>, duration: Option<f64>) -> Self {
        Self { ease, duration }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyFramesOptions {
    pub keys: Vec<Pose>,
    /// Indexed by segment: config `i` covers keys `i` and `i + 1`.
    pub key_config: Vec<KeyConfig>,
    pub timing: AnimateOptions,
}

impl KeyFramesOptions {
    pub fn new(keys: Vec<Pose>, timing: AnimateOptions) -> Self {
        Self {
            keys,
            key_config: Vec::new(),
            timing,
        }
    }

    pub fn key_config(mut self, config: Vec<KeyConfig>) -> Self {
        self.key_config = config;
        self
    }
}

#[derive(Debug)]
pub struct KeyFrames {
    pub base: Animate,
    keyframes: Vec<Pose>,
    key_config: Vec<KeyConfig>,
    /// Index of the segment's start key.
    key_index: usize,
    /// Traversal direction over the key list.
    cursor: i8,
    default_ease: EasingFunction,
    default_duration: f64,
}

impl KeyFrames {
    pub fn new(options: KeyFramesOptions) -> Self {
        let mut base = Animate::new(&options.timing);
        if options.keys.len() < 2 {
            tracing::warn!(
                count = options.keys.len(),
                "keyframes need at least two keys; animation discarded"
            );
            base.living = false;
        }
        let mut frames = Self {
            base,
            keyframes: options.keys,
            key_config: options.key_config,
            key_index: 0,
            cursor: 1,
            default_ease: options.timing.ease.clone(),
            default_duration: options.timing.duration.max(0.0),
        };
        frames.config_key();
        frames
    }

    pub fn key_index(&self) -> usize {
        self.key_index
    }

    pub fn cursor(&self) -> i8 {
        self.cursor
    }

    /// Load ease and duration for the segment starting at `key_index`.
    fn config_key(&mut self) {
        let segment = if self.cursor > 0 {
            self.key_index
        } else {
            self.key_index.saturating_sub(1)
        };
        let config = self.key_config.get(segment);
        let ease = config
            .and_then(|c| c.ease.clone())
            .unwrap_or_else(|| self.default_ease.clone());
        self.base.ease = if self.cursor > 0 { ease } else { ease.mirrored() };
        self.base.duration = config
            .and_then(|c| c.duration)
            .unwrap_or(self.default_duration)
            .max(0.0);
        self.base.progress = 0.0;
        self.base.total_time = 0.0;
    }

    fn next_index(&self, index: usize) -> Option<usize> {
        let next = index as isize + self.cursor as isize;
        if next >= 0 && (next as usize) < self.keyframes.len() {
            Some(next as usize)
        } else {
            None
        }
    }

    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        if !self.base.advance(snippet) {
            return Tick::Idle;
        }
        let Some(to_index) = self.next_index(self.key_index) else {
            return Tick::Idle;
        };

        let pose = self.next_pose(to_index);
        pose.apply_to(target);
        let ratio = self.base.ratio();
        self.base.notify(pose, ratio);

        if self.base.total_time < self.base.duration {
            return Tick::Running;
        }

        let overflow = self.base.total_time - self.base.duration;
        if self.next_index(to_index).is_some() {
            self.key_index = to_index;
            self.config_key();
            self.carry(overflow);
            return Tick::Running;
        }

        // End of a pass.
        if !self.base.take_repeat() {
            return self.base.complete();
        }
        if self.base.alternate {
            self.cursor = -self.cursor;
            self.key_index = to_index;
        } else {
            self.key_index = if self.cursor > 0 {
                0
            } else {
                self.keyframes.len() - 1
            };
        }
        self.config_key();
        if self.base.delay_cut <= 0.0 {
            self.carry(overflow);
        }
        Tick::Iteration
    }

    fn carry(&mut self, overflow: f64) {
        let step = overflow.min(self.base.duration);
        self.base.progress = step;
        self.base.total_time = step;
    }

    fn next_pose(&self, to_index: usize) -> Pose {
        let ratio = self.base.eased();
        let from = &self.keyframes[self.key_index];
        self.keyframes[to_index]
            .iter()
            .map(|(prop, to)| {
                let start = from.get(prop).unwrap_or(to);
                (prop, start + (to - start) * ratio)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::types::Prop;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[derive(Default)]
    struct Probe {
        x: f64,
    }

    impl Animatable for Probe {
        fn get_prop(&self, prop: Prop) -> f64 {
            if prop == Prop::X { self.x } else { 0.0 }
        }

        fn set_prop(&mut self, prop: Prop, value: f64) {
            if prop == Prop::X {
                self.x = value;
            }
        }
    }

    fn keys(xs: &[f64]) -> Vec<Pose> {
        xs.iter().map(|&x| Pose::new().with(Prop::X, x)).collect()
    }

    fn linear(duration: f64) -> AnimateOptions {
        AnimateOptions::new()
            .duration(duration)
            .ease(EasingFunction::Linear)
    }

    #[test]
    fn test_walks_segments_in_order() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(KeyFramesOptions::new(keys(&[0.0, 100.0, 50.0]), linear(100.0)));

        kf.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 50.0));
        kf.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 100.0));
        assert_eq!(kf.key_index(), 1);

        kf.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 75.0));
        assert_eq!(kf.update(50.0, &mut probe), Tick::Completed);
        assert!(approx_eq(probe.x, 50.0));
        assert!(!kf.base.living);
    }

    #[test]
    fn test_per_segment_duration_and_ease() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(
            KeyFramesOptions::new(keys(&[0.0, 10.0, 20.0]), linear(100.0)).key_config(vec![
                KeyConfig::new(None, Some(20.0)),
                KeyConfig::new(Some("quadIn".parse().unwrap()), None),
            ]),
        );
        kf.update(20.0, &mut probe);
        assert_eq!(kf.key_index(), 1);
        assert_eq!(kf.base.duration, 100.0);
        assert_eq!(kf.base.ease.name(), "quadIn");
        kf.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 12.5));
    }

    #[test]
    fn test_overflow_carries_into_next_segment() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(KeyFramesOptions::new(keys(&[0.0, 100.0, 200.0]), linear(100.0)));
        kf.update(130.0, &mut probe);
        assert_eq!(kf.key_index(), 1);
        assert!(approx_eq(kf.base.progress, 30.0));
    }

    #[test]
    fn test_alternate_reverses_cursor_not_direction() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(KeyFramesOptions::new(
            keys(&[0.0, 100.0, 200.0]),
            linear(100.0).alternate(true).repeats(1),
        ));
        kf.update(100.0, &mut probe);
        assert_eq!(kf.update(100.0, &mut probe), Tick::Iteration);
        assert_eq!(kf.cursor(), -1);
        assert_eq!(kf.key_index(), 2);
        assert_eq!(kf.base.direction, 1);

        kf.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 150.0));
        kf.update(50.0, &mut probe);
        kf.update(100.0, &mut probe);
        assert!(approx_eq(probe.x, 0.0));
        assert!(!kf.base.living);
    }

    #[test]
    fn test_repeat_without_alternate_restarts_at_zero() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(KeyFramesOptions::new(
            keys(&[0.0, 100.0]),
            linear(100.0).repeats(1),
        ));
        assert_eq!(kf.update(100.0, &mut probe), Tick::Iteration);
        assert_eq!(kf.key_index(), 0);
        kf.update(10.0, &mut probe);
        assert!(approx_eq(probe.x, 10.0));
    }

    #[test]
    fn test_too_few_keys_is_dead() {
        let mut probe = Probe::default();
        let mut kf = KeyFrames::new(KeyFramesOptions::new(keys(&[5.0]), linear(100.0)));
        assert!(!kf.base.living);
        assert_eq!(kf.update(10.0, &mut probe), Tick::Idle);
        assert_eq!(probe.x, 0.0);
    }
}
