use engine_core::{Color, Rectangle, Surface, TextAlign, TextStyle};

use super::Renderable;

/// Average advance of a glyph relative to the font size, used for bounds
/// when no shaping information is available.
const GLYPH_ADVANCE: f64 = 0.6;

/// Single-line text drawn at the node origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFace {
    pub text: String,
    pub style: TextStyle,
}

impl TextFace {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    pub fn font(mut self, family: &str, size: f64) -> Self {
        self.style.font_family = family.to_string();
        self.style.font_size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.style.color = color;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.style.align = align;
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Estimated advance width of the whole line.
    pub fn measure(&self) -> f64 {
        self.text.chars().count() as f64 * self.style.font_size * GLYPH_ADVANCE
    }
}

impl Renderable for TextFace {
    fn render_me(&self, surface: &mut dyn Surface) -> bool {
        if self.text.is_empty() {
            return false;
        }
        surface.fill_text(&self.text, 0.0, 0.0, &self.style);
        true
    }

    fn local_bounds(&self) -> Option<Rectangle> {
        if self.text.is_empty() {
            return None;
        }
        let width = self.measure();
        let x = match self.style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width / 2.0,
            TextAlign::Right => -width,
        };
        Some(Rectangle::new(x, 0.0, width, self.style.font_size))
    }
}
