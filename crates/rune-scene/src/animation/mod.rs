//! Animation subsystem for scene nodes.
//!
//! This module provides:
//! - **Animate**: shared timing state (wait, delay, repeats, alternate, pause)
//! - **Transition**: from/to property interpolation
//! - **PathMotion**: movement along a bezier curve, optionally tangent-aligned
//! - **KeyFrames**: multi-segment sequences with per-segment ease and duration
//! - **MovieClip**: discrete sprite-sheet frame stepping
//! - **AnimateRunner**: heterogeneous steps played end to end
//! - **Easing**: Penner curves, CSS cubic-bezier and steps, by name
//!
//! # Architecture
//!
//! ```text
//! Node
//!   └── AnimationManager (one per node)
//!         └── Animator::{Transition, PathMotion, KeyFrames, Runner, MovieClip}
//!               └── Animate (timing) ──writes Pose──▶ &mut dyn Animatable
//! ```

pub mod animate;
pub mod bezier;
pub mod easing;
pub mod events;
pub mod keyframes;
pub mod manager;
pub mod movie_clip;
pub mod path_motion;
pub mod runner;
pub mod transition;
pub mod types;

pub use animate::{Animate, AnimateOptions, CompleteCallback, Tick, UpdateCallback};
pub use bezier::BezierCurve;
pub use easing::{Curve, CustomEasing, EaseMode, EasingFunction, EasingRegistry, StepPosition};
pub use events::{AnimationEvent, AnimatorKind, EVENT_QUEUE_CAPACITY, EventQueue};
pub use keyframes::{KeyConfig, KeyFrames, KeyFramesOptions};
pub use manager::{AnimationManager, Animator};
pub use movie_clip::{ClipDescriptor, DEFAULT_CLIP_INTERVAL, FrameSpec, MIN_CLIP_INTERVAL, MovieClip};
pub use path_motion::{MotionOptions, PathMotion};
pub use runner::{AnimateRunner, RunnerOptions, RunnerStep};
pub use transition::{Transition, TransitionOptions};
pub use types::{Animatable, AnimationId, AnimationState, Pose, Prop, UnknownProp};
