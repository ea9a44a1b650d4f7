//! engine-core: value types and the drawing-surface boundary for the 2D engine.
//!
//! Nothing in this crate knows about the scene graph. It provides the
//! geometry the graph is built from (`Point`, `Matrix`, hit-test shapes,
//! `Bounds`), the `Surface` trait the graph paints into, a recording
//! implementation of that trait, and the blur post-process.

pub mod color;
pub mod display_list;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod matrix;
pub mod surface;

pub use color::Color;
pub use display_list::{Command, DisplayList, PathCmd, RecordingSurface};
pub use error::CoreError;
pub use filter::{BlurFilter, PixelBuffer};
pub use geometry::{Bounds, Circle, Ellipse, HitArea, Point, Polygon, Rectangle};
pub use matrix::Matrix;
pub use surface::{Surface, TextAlign, TextStyle};
