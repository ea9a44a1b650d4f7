//! Easing functions for animation timing.
//!
//! An easing maps linear progress (0.0 to 1.0) to an eased ratio. The table
//! covers:
//! - `linear`, `ease`, `easeIn`, `easeOut`, `easeBoth`, `smooth`
//! - the Penner families (`quad`, `cubic`, `quart`, `quint`, `sine`, `expo`,
//!   `circ`, `elastic`, `back`, `bounce`) with `In` / `Out` / `InOut` suffixes
//! - CSS-style cubic bezier curves and stepped timing
//! - named user curves registered on an [`EasingRegistry`]
//!
//! # Usage
//!
//! ```
//! use rune_scene::animation::easing::EasingFunction;
//!
//! let ease: EasingFunction = "quadIn".parse().unwrap();
//! let half = ease.evaluate(0.5); // 0.25
//!
//! // Alternate cycles play the mirrored curve.
//! assert_eq!(ease.mirrored().name(), "quadOut");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::SceneError;

/// Position for stepped animations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval.
    Start,
    /// Jump at the end of each interval.
    #[default]
    End,
    /// Jump at both start and end.
    Both,
    /// No jump at start or end.
    None,
}

impl StepPosition {
    fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Both => "both",
            Self::None => "none",
        }
    }
}

/// Curve family of the Penner easing equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Elastic,
    Back,
    Bounce,
}

impl Curve {
    const ALL: [Curve; 10] = [
        Curve::Quad,
        Curve::Cubic,
        Curve::Quart,
        Curve::Quint,
        Curve::Sine,
        Curve::Expo,
        Curve::Circ,
        Curve::Elastic,
        Curve::Back,
        Curve::Bounce,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Quad => "quad",
            Self::Cubic => "cubic",
            Self::Quart => "quart",
            Self::Quint => "quint",
            Self::Sine => "sine",
            Self::Expo => "expo",
            Self::Circ => "circ",
            Self::Elastic => "elastic",
            Self::Back => "back",
            Self::Bounce => "bounce",
        }
    }

    /// The `In` form; `Out` and `InOut` are derived from it.
    fn ease_in(self, t: f64) -> f64 {
        match self {
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Quart => t * t * t * t,
            Self::Quint => t * t * t * t * t,
            Self::Sine => 1.0 - (t * PI / 2.0).cos(),
            Self::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * (t - 1.0))
                }
            }
            Self::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Elastic => {
                if t <= 0.0 || t >= 1.0 {
                    return t;
                }
                let c4 = (2.0 * PI) / 3.0;
                -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
            }
            Self::Back => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                c3 * t * t * t - c1 * t * t
            }
            Self::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }

    fn evaluate(self, mode: EaseMode, t: f64) -> f64 {
        match mode {
            EaseMode::In => self.ease_in(t),
            EaseMode::Out => 1.0 - self.ease_in(1.0 - t),
            EaseMode::InOut => {
                if t < 0.5 {
                    self.ease_in(t * 2.0) / 2.0
                } else {
                    1.0 - self.ease_in((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;
    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

/// Which end of the curve carries the acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

impl EaseMode {
    fn suffix(self) -> &'static str {
        match self {
            Self::In => "In",
            Self::Out => "Out",
            Self::InOut => "InOut",
        }
    }

    fn mirrored(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
            Self::InOut => Self::InOut,
        }
    }
}

/// A user-registered curve. Compared by name.
#[derive(Clone)]
pub struct CustomEasing {
    name: String,
    curve: Rc<dyn Fn(f64) -> f64>,
}

impl CustomEasing {
    pub fn new<F>(name: impl Into<String>, curve: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Self {
            name: name.into(),
            curve: Rc::new(curve),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomEasing").field(&self.name).finish()
    }
}

impl PartialEq for CustomEasing {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Easing function for animation timing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// No easing.
    Linear,

    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,

    /// Slow start, `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,

    /// Slow end, `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,

    /// Slow start and end, `cubic-bezier(0.42, 0, 0.58, 1)`.
    #[default]
    EaseBoth,

    /// Smoothstep, `t² (3 - 2t)`.
    Smooth,

    Penner {
        curve: Curve,
        mode: EaseMode,
    },

    /// x values are kept in [0, 1], y values may overshoot.
    CubicBezier {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },

    Steps {
        count: u32,
        position: StepPosition,
    },

    #[serde(skip)]
    Custom(CustomEasing),
}

impl EasingFunction {
    /// Evaluate at linear progress `t`, clamped to 0.0..=1.0.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseBoth => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::Smooth => t * t * (3.0 - 2.0 * t),
            Self::Penner { curve, mode } => curve.evaluate(*mode, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
            Self::Custom(custom) => (custom.curve)(t),
        }
    }

    /// Classic tween signature: value at `elapsed` of a change from `begin`
    /// by `change` over `duration`.
    pub fn tween(&self, elapsed: f64, begin: f64, change: f64, duration: f64) -> f64 {
        let t = if duration > 0.0 { elapsed / duration } else { 1.0 };
        begin + change * self.evaluate(t)
    }

    /// Custom cubic bezier; x control values are clamped into [0, 1].
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            tracing::warn!(x1, x2, "bezier x values outside [0, 1], clamping");
        }
        Self::CubicBezier {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    /// Stepped easing; a count of zero is treated as one.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        Self::Steps {
            count: count.max(1),
            position,
        }
    }

    pub fn penner(curve: Curve, mode: EaseMode) -> Self {
        Self::Penner { curve, mode }
    }

    /// Canonical name; parses back to an equal function.
    pub fn name(&self) -> String {
        match self {
            Self::Linear => "linear".into(),
            Self::Ease => "ease".into(),
            Self::EaseIn => "easeIn".into(),
            Self::EaseOut => "easeOut".into(),
            Self::EaseBoth => "easeBoth".into(),
            Self::Smooth => "smooth".into(),
            Self::Penner { curve, mode } => format!("{}{}", curve.name(), mode.suffix()),
            Self::CubicBezier { x1, y1, x2, y2 } => bezier_signature(*x1, *y1, *x2, *y2),
            Self::Steps { count, position } => format!("steps({},{})", count, position.name()),
            Self::Custom(custom) => custom.name.clone(),
        }
    }

    /// The curve used when an alternating animation plays backwards: `In`
    /// and `Out` swap, symmetric curves are returned unchanged.
    pub fn mirrored(&self) -> Self {
        match self {
            Self::EaseIn => Self::EaseOut,
            Self::EaseOut => Self::EaseIn,
            Self::Penner { curve, mode } => Self::Penner {
                curve: *curve,
                mode: mode.mirrored(),
            },
            Self::CubicBezier { x1, y1, x2, y2 } => Self::CubicBezier {
                x1: 1.0 - x2,
                y1: 1.0 - y2,
                x2: 1.0 - x1,
                y2: 1.0 - y1,
            },
            Self::Steps { count, position } => Self::Steps {
                count: *count,
                position: match position {
                    StepPosition::Start => StepPosition::End,
                    StepPosition::End => StepPosition::Start,
                    other => *other,
                },
            },
            Self::Custom(custom) => {
                let inner = Rc::clone(&custom.curve);
                Self::Custom(CustomEasing {
                    name: swap_in_out(&custom.name),
                    curve: Rc::new(move |t| 1.0 - inner(1.0 - t)),
                })
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for EasingFunction {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let unknown = || SceneError::UnknownEasing(name.to_string());

        match name {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::Ease),
            "easeIn" => return Ok(Self::EaseIn),
            "easeOut" => return Ok(Self::EaseOut),
            "easeBoth" | "easeInOut" => return Ok(Self::EaseBoth),
            "smooth" => return Ok(Self::Smooth),
            _ => {}
        }

        if let Some(args) = call_args(name, &["bezier", "cubic-bezier"]) {
            let values: Vec<f64> = args
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| unknown())?;
            if let &[x1, y1, x2, y2] = values.as_slice() {
                return Ok(Self::cubic_bezier(x1, y1, x2, y2));
            }
            return Err(unknown());
        }

        if let Some(args) = call_args(name, &["steps"]) {
            let mut parts = args.split(',').map(str::trim);
            let count = parts
                .next()
                .and_then(|c| c.parse::<u32>().ok())
                .ok_or_else(unknown)?;
            let position = match parts.next() {
                None | Some("end") => StepPosition::End,
                Some("start") => StepPosition::Start,
                Some("both") => StepPosition::Both,
                Some("none") => StepPosition::None,
                Some(_) => return Err(unknown()),
            };
            return Ok(Self::steps(count, position));
        }

        // Longest suffix first so "InOut" is not read as "Out".
        for mode in [EaseMode::InOut, EaseMode::In, EaseMode::Out] {
            if let Some(family) = name.strip_suffix(mode.suffix()) {
                if let Some(curve) = Curve::ALL.iter().find(|c| c.name() == family) {
                    return Ok(Self::Penner {
                        curve: *curve,
                        mode,
                    });
                }
            }
        }

        Err(unknown())
    }
}

/// `name(args)` → `args`, for any of the accepted names.
fn call_args<'a>(s: &'a str, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| {
        s.strip_prefix(n)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
    })
}

fn bezier_signature(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    format!("bezier({},{},{},{})", x1, y1, x2, y2)
}

/// Swap a trailing `In` / `Out` (but not `InOut`).
fn swap_in_out(name: &str) -> String {
    if name.ends_with("InOut") {
        name.to_string()
    } else if let Some(stem) = name.strip_suffix("In") {
        format!("{}Out", stem)
    } else if let Some(stem) = name.strip_suffix("Out") {
        format!("{}In", stem)
    } else {
        name.to_string()
    }
}

/// Named curves plus a cache of bezier curves keyed by their signature.
#[derive(Debug, Default)]
pub struct EasingRegistry {
    curves: HashMap<String, EasingFunction>,
}

impl EasingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named curve.
    pub fn register<F>(&mut self, name: &str, curve: F) -> EasingFunction
    where
        F: Fn(f64) -> f64 + 'static,
    {
        let ease = EasingFunction::Custom(CustomEasing::new(name, curve));
        if self.curves.insert(name.to_string(), ease.clone()).is_some() {
            tracing::debug!(name, "replaced registered easing");
        }
        ease
    }

    /// Bezier easing, cached under `bezier(x1,y1,x2,y2)`.
    pub fn bezier(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> EasingFunction {
        let key = bezier_signature(x1, y1, x2, y2);
        self.curves
            .entry(key)
            .or_insert_with(|| EasingFunction::cubic_bezier(x1, y1, x2, y2))
            .clone()
    }

    /// Registered names first, then the built-in table.
    pub fn resolve(&self, name: &str) -> Result<EasingFunction, SceneError> {
        match self.curves.get(name) {
            Some(ease) => Ok(ease.clone()),
            None => name.parse(),
        }
    }

    /// Like `resolve`, but falls back to `easeBoth` with a warning.
    pub fn resolve_or_default(&self, name: &str) -> EasingFunction {
        self.resolve(name).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to easeBoth");
            EasingFunction::EaseBoth
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

/// Evaluate a cubic bezier curve at time t.
///
/// Newton-Raphson finds the curve parameter whose x equals the progress,
/// then y is evaluated at that parameter.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            return t;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }

        t -= x / dx;
        t = t.clamp(0.0, 1.0);
    }

    // Newton stalled on a flat segment; bisect instead.
    let (mut lo, mut hi) = (0.0, 1.0);
    t = target_x;
    for _ in 0..32 {
        let x = bezier_component(x1, x2, t);
        if (x - target_x).abs() < 1e-7 {
            break;
        }
        if x < target_x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    t
}

/// One axis of the curve: 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f64, x2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f64) -> f64 {
    if steps == 0 {
        return t;
    }

    let steps_f = steps as f64;

    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
        StepPosition::Both => {
            let total_steps = steps_f + 1.0;
            ((t * total_steps).floor() / steps_f).min(1.0)
        }
        StepPosition::None => {
            if steps == 1 {
                0.5
            } else {
                let effective_steps = steps_f - 1.0;
                ((t * steps_f).floor() / effective_steps).min(1.0)
            }
        }
    }
}
