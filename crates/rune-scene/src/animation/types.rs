//! Core animation types.
//!
//! - `AnimationId`: handle returned by the animation host factories
//! - `Prop`: the closed set of node properties an animation may drive
//! - `Pose`: an ordered `Prop → value` map produced each tick
//! - `Animatable`: what an animation writes its pose into

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an animation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    /// Generate a new unique animation ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AnimationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse lifecycle state, derived from the timing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    /// Counting down `wait`.
    Waiting,
    /// Counting down `delay` before a cycle.
    Delaying,
    Running,
    Paused,
    /// Logically complete; only resident animations stay in this state.
    Finished,
    /// No longer living.
    Dead,
}

/// Animatable node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Prop {
    X,
    Y,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
    /// Degrees.
    Rotation,
    PivotX,
    PivotY,
    Alpha,
}

impl Prop {
    pub const ALL: [Prop; 10] = [
        Prop::X,
        Prop::Y,
        Prop::ScaleX,
        Prop::ScaleY,
        Prop::SkewX,
        Prop::SkewY,
        Prop::Rotation,
        Prop::PivotX,
        Prop::PivotY,
        Prop::Alpha,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::SkewX => "skewX",
            Self::SkewY => "skewY",
            Self::Rotation => "rotation",
            Self::PivotX => "pivotX",
            Self::PivotY => "pivotY",
            Self::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized property name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProp(pub String);

impl FromStr for Prop {
    type Err = UnknownProp;

    /// Accepts camelCase and snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "x" => Self::X,
            "y" => Self::Y,
            "scaleX" | "scale_x" => Self::ScaleX,
            "scaleY" | "scale_y" => Self::ScaleY,
            "skewX" | "skew_x" => Self::SkewX,
            "skewY" | "skew_y" => Self::SkewY,
            "rotation" => Self::Rotation,
            "pivotX" | "pivot_x" => Self::PivotX,
            "pivotY" | "pivot_y" => Self::PivotY,
            "alpha" => Self::Alpha,
            other => return Err(UnknownProp(other.to_string())),
        })
    }
}

/// Interpolated property values for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose(BTreeMap<Prop, f64>);

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from string keys; unknown names are dropped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut pose = Self::new();
        for (key, value) in pairs {
            match key.parse::<Prop>() {
                Ok(prop) => {
                    pose.0.insert(prop, value);
                }
                Err(UnknownProp(name)) => {
                    tracing::debug!(%name, "ignoring non-animatable property");
                }
            }
        }
        pose
    }

    pub fn with(mut self, prop: Prop, value: f64) -> Self {
        self.0.insert(prop, value);
        self
    }

    pub fn set(&mut self, prop: Prop, value: f64) {
        self.0.insert(prop, value);
    }

    pub fn get(&self, prop: Prop) -> Option<f64> {
        self.0.get(&prop).copied()
    }

    pub fn contains(&self, prop: Prop) -> bool {
        self.0.contains_key(&prop)
    }

    pub fn props(&self) -> impl Iterator<Item = Prop> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prop, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Current values of `props` read from `target`.
    pub fn capture<T, I>(target: &T, props: I) -> Self
    where
        T: Animatable + ?Sized,
        I: IntoIterator<Item = Prop>,
    {
        let mut pose = Self::new();
        for prop in props {
            pose.set(prop, target.get_prop(prop));
        }
        pose
    }

    /// Write every value into `target`.
    pub fn apply_to<T: Animatable + ?Sized>(&self, target: &mut T) {
        for (prop, value) in self.iter() {
            target.set_prop(prop, value);
        }
    }
}

impl FromIterator<(Prop, f64)> for Pose {
    fn from_iter<I: IntoIterator<Item = (Prop, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Something an animation can drive.
pub trait Animatable {
    fn get_prop(&self, prop: Prop) -> f64;
    fn set_prop(&mut self, prop: Prop, value: f64);
    /// Sprite-sheet frame; ignored by targets without frames.
    fn set_frame(&mut self, _frame: usize) {}
}
