//! rune-scene: retained-mode 2D scene graph with a frame-driven animation
//! system.
//!
//! A [`Stage`] owns a [`SceneTree`] of [`Node`]s. Every frame the stage
//! measures the elapsed time, ticks each node's animations, recomputes world
//! transforms top-down and then paints visible, ready nodes into an
//! [`engine_core::Surface`]. Update and render are separate passes.
//!
//! ```ignore
//! let mut stage = Stage::new(800, 600);
//! let root = stage.root();
//! let hero = stage.tree_mut().create(root, Node::sprite(sprite).at(400.0, 300.0));
//! stage.tree_mut().node_mut(hero).unwrap().animation.to(
//!     TransitionOptions::to(Pose::new().with(Prop::X, 100.0), AnimateOptions::new().duration(500.0)),
//!     false,
//! );
//! stage.tick(now, &mut surface);
//! ```

pub mod animation;
pub mod elements;
pub mod error;
pub mod eventer;
pub mod interaction;
pub mod node;
pub mod stage;
pub mod texture;
pub mod tree;

pub use animation::{
    Animatable, AnimateOptions, AnimationEvent, AnimationId, AnimationManager, AnimationState,
    ClipDescriptor, EasingFunction, KeyFramesOptions, MotionOptions, Pose, Prop, RunnerOptions,
    RunnerStep, Tick, TransitionOptions,
};
pub use elements::{Graphics, Renderable, Sprite, TextFace};
pub use error::SceneError;
pub use eventer::{Eventer, ListenerId};
pub use interaction::{EventResult, InteractionEvent, InteractionManager};
pub use node::{Node, NodeId, NodeKind, Posture};
pub use stage::Stage;
pub use texture::{Loader, LoaderEvent, Texture, TextureState};
pub use tree::SceneTree;
