//! Renderable node payloads.
//!
//! Each element draws itself in its node's local space; the tree has already
//! set the surface transform and alpha before `render_me` runs.

pub mod graphics;
pub mod sprite;
pub mod text;

pub use graphics::{Graphics, Shape};
pub use sprite::Sprite;
pub use text::TextFace;

use engine_core::{Rectangle, Surface};

pub trait Renderable {
    /// Draw in local coordinates. Returns whether anything was drawn.
    fn render_me(&self, surface: &mut dyn Surface) -> bool;

    /// Local-space extent used for bounds and `set_bound`.
    fn local_bounds(&self) -> Option<Rectangle> {
        None
    }

    /// Install this element's geometry as the current clip. Returns false
    /// when the element cannot act as a mask.
    fn clip_me(&self, surface: &mut dyn Surface) -> bool {
        let _ = surface;
        false
    }

    /// False while a resource the element needs is still pending.
    fn is_ready(&self) -> bool {
        true
    }
}
