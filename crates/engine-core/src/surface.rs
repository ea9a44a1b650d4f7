//! The immediate-mode drawing surface the scene graph paints into.
//!
//! This mirrors a canvas-like 2D context: a save/restore state stack, a
//! current transform and global alpha, path construction, fill/stroke and
//! image blits. The scene graph only ever talks to this trait; rasterization
//! lives with whoever implements it.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::filter::PixelBuffer;
use crate::geometry::Rectangle;
use crate::matrix::Matrix;

/// Horizontal text anchoring relative to the draw position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font and fill settings for a single `fill_text` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub color: Color,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }
}

pub trait Surface {
    /// Current pixel size of the backing store.
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);

    fn save(&mut self);
    fn restore(&mut self);
    /// Replace (not multiply) the current transform.
    fn set_transform(&mut self, m: &Matrix);
    fn set_global_alpha(&mut self, alpha: f64);

    fn clear_rect(&mut self, rect: Rectangle);
    fn fill_rect(&mut self, rect: Rectangle);

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn rect(&mut self, rect: Rectangle);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn clip(&mut self);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    /// Blit `src` of the image registered under `image` into `dst`.
    fn draw_image(&mut self, image: &str, src: Rectangle, dst: Rectangle);

    /// Read back a device-space pixel region; `None` if unsupported.
    fn get_image_data(&self, rect: Rectangle) -> Option<PixelBuffer>;
    fn put_image_data(&mut self, data: &PixelBuffer, x: i64, y: i64);
}
