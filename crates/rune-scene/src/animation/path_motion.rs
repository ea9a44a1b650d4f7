//! Movement along a bezier curve.
//!
//! Position comes from the curve at the eased ratio. With `attach_tangent`
//! the node also turns to follow the curve: the rotation is the signed angle
//! between the node's initial facing and the local tangent, added to the
//! rotation it had when the motion started.

use engine_core::Point;

use super::animate::{Animate, AnimateOptions, Tick};
use super::bezier::BezierCurve;
use super::types::{Animatable, Pose, Prop};

/// Parameter step of the forward difference used for the tangent.
const TANGENT_STEP: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct MotionOptions {
    pub path: BezierCurve,
    pub attach_tangent: bool,
    /// Move at constant speed along the arc instead of by curve parameter.
    pub length_mode: bool,
    pub timing: AnimateOptions,
}

impl MotionOptions {
    pub fn new(path: BezierCurve, timing: AnimateOptions) -> Self {
        Self {
            path,
            attach_tangent: false,
            length_mode: false,
            timing,
        }
    }

    pub fn attach_tangent(mut self, attach: bool) -> Self {
        self.attach_tangent = attach;
        self
    }

    pub fn length_mode(mut self, enabled: bool) -> Self {
        self.length_mode = enabled;
        self
    }
}

#[derive(Debug)]
pub struct PathMotion {
    pub base: Animate,
    path: BezierCurve,
    attach_tangent: bool,
    length_mode: bool,
    /// Rotation in degrees when the motion first got past its gates.
    cache_rotate: Option<f64>,
    /// Initial facing direction.
    cache_vector: Point,
    /// Last non-degenerate tangent angle.
    pre_degree: f64,
}

impl PathMotion {
    pub fn new(options: MotionOptions) -> Self {
        Self {
            base: Animate::new(&options.timing),
            path: options.path,
            attach_tangent: options.attach_tangent,
            length_mode: options.length_mode,
            cache_rotate: None,
            cache_vector: Point::new(10.0, 0.0),
            pre_degree: 0.0,
        }
    }

    pub fn path(&self) -> &BezierCurve {
        &self.path
    }

    /// Advance by `snippet` ms and place the target on the path.
    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        if !self.base.advance(snippet) {
            return Tick::Idle;
        }
        if self.cache_rotate.is_none() {
            let rotation = target.get_prop(Prop::Rotation);
            let radian = rotation.to_radians();
            self.cache_rotate = Some(rotation);
            self.cache_vector = Point::new(10.0 * radian.cos(), 10.0 * radian.sin());
        }
        let pose = self.next_pose();
        pose.apply_to(target);
        self.base.settle(pose)
    }

    fn next_pose(&mut self) -> Pose {
        let ratio = self.base.eased();
        let pos = if self.length_mode {
            self.path.point_at_length(ratio)
        } else {
            self.path.point_at(ratio)
        };
        let mut pose = Pose::new().with(Prop::X, pos.x).with(Prop::Y, pos.y);

        if self.attach_tangent {
            let degree = match self.tangent_degree(ratio) {
                Some(d) => {
                    self.pre_degree = d;
                    d
                }
                None => self.pre_degree,
            };
            pose.set(Prop::Rotation, degree + self.cache_rotate.unwrap_or(0.0));
        }
        pose
    }

    /// Signed angle in degrees from the initial facing to the tangent at `t`;
    /// `None` when the tangent has no length.
    fn tangent_degree(&self, t: f64) -> Option<f64> {
        let v = self.path.tangent_at(t, TANGENT_STEP);
        let base = self.cache_vector;
        let cross = base.x * v.y - base.y * v.x;
        let sign = if cross >= 0.0 { 1.0 } else { -1.0 };
        let cos = (base.x * v.x + base.y * v.y) / (base.length() * v.length());
        if cos.is_nan() {
            tracing::trace!(t, "degenerate tangent, reusing previous rotation");
            return None;
        }
        Some(sign * cos.clamp(-1.0, 1.0).acos().to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::easing::EasingFunction;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[derive(Default)]
    struct Probe {
        x: f64,
        y: f64,
        rotation: f64,
    }

    impl Animatable for Probe {
        fn get_prop(&self, prop: Prop) -> f64 {
            match prop {
                Prop::X => self.x,
                Prop::Y => self.y,
                Prop::Rotation => self.rotation,
                _ => 0.0,
            }
        }

        fn set_prop(&mut self, prop: Prop, value: f64) {
            match prop {
                Prop::X => self.x = value,
                Prop::Y => self.y = value,
                Prop::Rotation => self.rotation = value,
                _ => {}
            }
        }
    }

    fn line(from: (f64, f64), to: (f64, f64)) -> BezierCurve {
        BezierCurve::new(vec![Point::new(from.0, from.1), Point::new(to.0, to.1)])
    }

    fn linear(duration: f64) -> AnimateOptions {
        AnimateOptions::new()
            .duration(duration)
            .ease(EasingFunction::Linear)
    }

    #[test]
    fn test_moves_along_path() {
        let mut probe = Probe::default();
        let mut motion = PathMotion::new(MotionOptions::new(
            line((0.0, 0.0), (100.0, 50.0)),
            linear(100.0),
        ));
        motion.update(50.0, &mut probe);
        assert!(approx_eq(probe.x, 50.0));
        assert!(approx_eq(probe.y, 25.0));
        assert_eq!(motion.update(50.0, &mut probe), Tick::Completed);
        assert!(approx_eq(probe.x, 100.0));
    }

    #[test]
    fn test_tangent_rotation_is_signed() {
        // Facing +x, moving straight down (+y): a quarter turn clockwise.
        let mut probe = Probe::default();
        let mut motion = PathMotion::new(
            MotionOptions::new(line((0.0, 0.0), (0.0, 100.0)), linear(100.0))
                .attach_tangent(true),
        );
        motion.update(10.0, &mut probe);
        assert!(approx_eq(probe.rotation, 90.0));

        // Moving up turns the other way.
        let mut probe = Probe::default();
        let mut motion = PathMotion::new(
            MotionOptions::new(line((0.0, 0.0), (0.0, -100.0)), linear(100.0))
                .attach_tangent(true),
        );
        motion.update(10.0, &mut probe);
        assert!(approx_eq(probe.rotation, -90.0));
    }

    #[test]
    fn test_tangent_adds_initial_rotation() {
        let mut probe = Probe {
            rotation: 30.0,
            ..Default::default()
        };
        // Already facing along the path: no extra turn.
        let dir = 30f64.to_radians();
        let mut motion = PathMotion::new(
            MotionOptions::new(
                line((0.0, 0.0), (100.0 * dir.cos(), 100.0 * dir.sin())),
                linear(100.0),
            )
            .attach_tangent(true),
        );
        motion.update(10.0, &mut probe);
        assert!((probe.rotation - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_delayed_motion_reads_rotation_when_it_starts() {
        let mut probe = Probe::default();
        let mut motion = PathMotion::new(
            MotionOptions::new(line((0.0, 0.0), (0.0, 100.0)), linear(100.0).delay(50.0))
                .attach_tangent(true),
        );
        assert_eq!(motion.update(50.0, &mut probe), Tick::Idle);
        probe.rotation = 45.0;
        motion.update(10.0, &mut probe);
        // Facing 45 degrees, moving straight down: another 45 clockwise.
        assert!(approx_eq(probe.rotation, 90.0));
    }

    #[test]
    fn test_degenerate_tangent_keeps_previous_degree() {
        let mut probe = Probe::default();
        let mut motion = PathMotion::new(
            MotionOptions::new(line((5.0, 5.0), (5.0, 5.0)), linear(100.0)).attach_tangent(true),
        );
        motion.update(10.0, &mut probe);
        assert_eq!(probe.rotation, 0.0);
        assert!(probe.rotation.is_finite());
    }
}
