//! A `Surface` that records every call into a flat display list.
//!
//! Used headless (tests, the demo driver) and as a capture format for hosts
//! that replay frames into a real canvas. Draw commands carry the transform
//! and alpha that were current when they were issued, so a consumer does not
//! need to replay the state stack to interpret them.

use crate::color::Color;
use crate::filter::PixelBuffer;
use crate::geometry::Rectangle;
use crate::matrix::Matrix;
use crate::surface::{Surface, TextStyle};

#[derive(Clone, Debug, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    },
    Rect(Rectangle),
    Close,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Save,
    Restore,
    SetTransform(Matrix),
    SetAlpha(f64),
    ClearRect(Rectangle),
    FillRect {
        rect: Rectangle,
        color: Color,
        transform: Matrix,
        alpha: f64,
    },
    FillPath {
        path: Vec<PathCmd>,
        color: Color,
        transform: Matrix,
        alpha: f64,
    },
    StrokePath {
        path: Vec<PathCmd>,
        color: Color,
        width: f64,
        transform: Matrix,
        alpha: f64,
    },
    Clip {
        path: Vec<PathCmd>,
        transform: Matrix,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        style: TextStyle,
        transform: Matrix,
        alpha: f64,
    },
    DrawImage {
        image: String,
        src: Rectangle,
        dst: Rectangle,
        transform: Matrix,
        alpha: f64,
    },
    PutImageData {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Matrix,
    alpha: f64,
    fill: Color,
    stroke: Color,
    line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Matrix::identity(),
            alpha: 1.0,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayList {
    width: u32,
    height: u32,
    pub commands: Vec<Command>,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<PathCmd>,
    pixels: PixelBuffer,
}

/// Alias that reads better at call sites that only care about the trait.
pub type RecordingSurface = DisplayList;

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            pixels: PixelBuffer::new(width, height),
        }
    }

    /// Drop recorded commands, keeping size and pixel contents.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.stack.clear();
        self.path.clear();
        self.state = DrawState::default();
    }

    pub fn current_transform(&self) -> Matrix {
        self.state.transform
    }

    pub fn current_alpha(&self) -> f64 {
        self.state.alpha
    }

    /// Save/restore nesting depth; zero when balanced.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Backing pixels written by `put_image_data`.
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Every `DrawImage` command, in paint order.
    pub fn images(&self) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawImage { .. }))
    }
}

impl Surface for DisplayList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = PixelBuffer::new(width, height);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
        self.commands.push(Command::Save);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => tracing::warn!("restore without a matching save"),
        }
        self.commands.push(Command::Restore);
    }

    fn set_transform(&mut self, m: &Matrix) {
        self.state.transform = *m;
        self.commands.push(Command::SetTransform(*m));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
        self.commands.push(Command::SetAlpha(alpha));
    }

    fn clear_rect(&mut self, rect: Rectangle) {
        self.commands.push(Command::ClearRect(rect));
    }

    fn fill_rect(&mut self, rect: Rectangle) {
        self.commands.push(Command::FillRect {
            rect,
            color: self.state.fill,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(PathCmd::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.push(PathCmd::LineTo(x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.path.push(PathCmd::QuadTo(cpx, cpy, x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.path.push(PathCmd::CubicTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.path.push(PathCmd::Arc {
            x,
            y,
            radius,
            start,
            end,
            anticlockwise,
        });
    }

    fn rect(&mut self, rect: Rectangle) {
        self.path.push(PathCmd::Rect(rect));
    }

    fn close_path(&mut self) {
        self.path.push(PathCmd::Close);
    }

    fn fill(&mut self) {
        self.commands.push(Command::FillPath {
            path: self.path.clone(),
            color: self.state.fill,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
    }

    fn stroke(&mut self) {
        self.commands.push(Command::StrokePath {
            path: self.path.clone(),
            color: self.state.stroke,
            width: self.state.line_width,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
    }

    fn clip(&mut self) {
        self.commands.push(Command::Clip {
            path: self.path.clone(),
            transform: self.state.transform,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        self.commands.push(Command::FillText {
            text: text.to_string(),
            x,
            y,
            style: style.clone(),
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
    }

    fn draw_image(&mut self, image: &str, src: Rectangle, dst: Rectangle) {
        self.commands.push(Command::DrawImage {
            image: image.to_string(),
            src,
            dst,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
    }

    fn get_image_data(&self, rect: Rectangle) -> Option<PixelBuffer> {
        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = (rect.right().ceil().max(0.0) as u32).min(self.width);
        let y1 = (rect.bottom().ceil().max(0.0) as u32).min(self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let mut out = PixelBuffer::new(x1 - x0, y1 - y0);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(px) = self.pixels.get_pixel(x, y) {
                    out.set_pixel(x - x0, y - y0, px);
                }
            }
        }
        Some(out)
    }

    fn put_image_data(&mut self, data: &PixelBuffer, x: i64, y: i64) {
        for sy in 0..data.height {
            for sx in 0..data.width {
                let (dx, dy) = (x + sx as i64, y + sy as i64);
                if dx < 0 || dy < 0 {
                    continue;
                }
                if let Some(px) = data.get_pixel(sx, sy) {
                    self.pixels.set_pixel(dx as u32, dy as u32, px);
                }
            }
        }
        self.commands.push(Command::PutImageData {
            x,
            y,
            width: data.width,
            height: data.height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_rolls_back_state() {
        let mut list = DisplayList::new(100, 100);
        list.save();
        list.set_transform(&Matrix::from_translation(5.0, 5.0));
        list.set_global_alpha(0.5);
        assert_eq!(list.depth(), 1);
        list.restore();
        assert_eq!(list.depth(), 0);
        assert_eq!(list.current_transform(), Matrix::identity());
        assert_eq!(list.current_alpha(), 1.0);
    }

    #[test]
    fn test_draw_commands_capture_current_state() {
        let mut list = DisplayList::new(100, 100);
        list.set_transform(&Matrix::from_translation(3.0, 4.0));
        list.set_global_alpha(0.25);
        list.draw_image(
            "hero",
            Rectangle::new(0.0, 0.0, 10.0, 10.0),
            Rectangle::new(0.0, 0.0, 10.0, 10.0),
        );
        match list.images().next() {
            Some(Command::DrawImage {
                image,
                transform,
                alpha,
                ..
            }) => {
                assert_eq!(image, "hero");
                assert_eq!(transform.tx, 3.0);
                assert_eq!(*alpha, 0.25);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_image_data_round_trip() {
        let mut list = DisplayList::new(4, 4);
        let mut patch = PixelBuffer::new(2, 2);
        patch.set_pixel(1, 1, [9, 9, 9, 9]);
        list.put_image_data(&patch, 1, 1);
        let read = list.get_image_data(Rectangle::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        assert_eq!(read.get_pixel(2, 2), Some([9, 9, 9, 9]));
        assert!(list.get_image_data(Rectangle::new(10.0, 10.0, 2.0, 2.0)).is_none());
    }
}
