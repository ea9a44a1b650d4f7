use engine_core::{Bounds, Color, PathCmd, Rectangle, Surface};

use super::Renderable;

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub path: Vec<PathCmd>,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f64)>,
}

/// Retained vector drawing.
///
/// Path commands accumulate until `fill` or `stroke` closes them into a
/// shape; shapes replay in order on every render. A Graphics node used as a
/// mask clips to the union of its shapes' paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graphics {
    shapes: Vec<Shape>,
    current: Vec<PathCmd>,
}

impl Graphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.current.push(PathCmd::MoveTo(x, y));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.current.push(PathCmd::LineTo(x, y));
        self
    }

    pub fn quad_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> &mut Self {
        self.current.push(PathCmd::QuadTo(cpx, cpy, x, y));
        self
    }

    pub fn bezier_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> &mut Self {
        self.current.push(PathCmd::CubicTo(cp1x, cp1y, cp2x, cp2y, x, y));
        self
    }

    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) -> &mut Self {
        self.current.push(PathCmd::Arc {
            x,
            y,
            radius,
            start,
            end,
            anticlockwise,
        });
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.current.push(PathCmd::Rect(Rectangle::new(x, y, width, height)));
        self
    }

    pub fn circle(&mut self, x: f64, y: f64, radius: f64) -> &mut Self {
        self.arc(x, y, radius, 0.0, std::f64::consts::TAU, false)
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.current.push(PathCmd::Close);
        self
    }

    pub fn fill(&mut self, color: Color) -> &mut Self {
        self.finish(Some(color), None)
    }

    pub fn stroke(&mut self, color: Color, width: f64) -> &mut Self {
        self.finish(None, Some((color, width)))
    }

    pub fn fill_and_stroke(&mut self, fill: Color, stroke: Color, width: f64) -> &mut Self {
        self.finish(Some(fill), Some((stroke, width)))
    }

    fn finish(&mut self, fill: Option<Color>, stroke: Option<(Color, f64)>) -> &mut Self {
        if self.current.is_empty() {
            tracing::debug!("fill/stroke with an empty path");
            return self;
        }
        self.shapes.push(Shape {
            path: std::mem::take(&mut self.current),
            fill,
            stroke,
        });
        self
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.current.clear();
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    fn trace(surface: &mut dyn Surface, path: &[PathCmd]) {
        for cmd in path {
            match *cmd {
                PathCmd::MoveTo(x, y) => surface.move_to(x, y),
                PathCmd::LineTo(x, y) => surface.line_to(x, y),
                PathCmd::QuadTo(cpx, cpy, x, y) => surface.quadratic_curve_to(cpx, cpy, x, y),
                PathCmd::CubicTo(a, b, c, d, x, y) => surface.bezier_curve_to(a, b, c, d, x, y),
                PathCmd::Arc {
                    x,
                    y,
                    radius,
                    start,
                    end,
                    anticlockwise,
                } => surface.arc(x, y, radius, start, end, anticlockwise),
                PathCmd::Rect(rect) => surface.rect(rect),
                PathCmd::Close => surface.close_path(),
            }
        }
    }
}

impl Renderable for Graphics {
    fn render_me(&self, surface: &mut dyn Surface) -> bool {
        for shape in &self.shapes {
            surface.begin_path();
            Self::trace(surface, &shape.path);
            if let Some(color) = shape.fill {
                surface.set_fill_style(color);
                surface.fill();
            }
            if let Some((color, width)) = shape.stroke {
                surface.set_stroke_style(color);
                surface.set_line_width(width);
                surface.stroke();
            }
        }
        true
    }

    /// Control-point hull of every shape; arcs contribute their full circle.
    fn local_bounds(&self) -> Option<Rectangle> {
        let mut bounds = Bounds::new();
        for shape in &self.shapes {
            let pad = shape.stroke.map_or(0.0, |(_, w)| w / 2.0);
            let mut add = |x: f64, y: f64| {
                bounds.add_point(x - pad, y - pad);
                bounds.add_point(x + pad, y + pad);
            };
            for cmd in &shape.path {
                match *cmd {
                    PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => add(x, y),
                    PathCmd::QuadTo(cpx, cpy, x, y) => {
                        add(cpx, cpy);
                        add(x, y);
                    }
                    PathCmd::CubicTo(a, b, c, d, x, y) => {
                        add(a, b);
                        add(c, d);
                        add(x, y);
                    }
                    PathCmd::Arc { x, y, radius, .. } => {
                        add(x - radius, y - radius);
                        add(x + radius, y + radius);
                    }
                    PathCmd::Rect(rect) => {
                        add(rect.x, rect.y);
                        add(rect.right(), rect.bottom());
                    }
                    PathCmd::Close => {}
                }
            }
        }
        (!bounds.is_empty()).then(|| bounds.rectangle())
    }

    fn clip_me(&self, surface: &mut dyn Surface) -> bool {
        surface.begin_path();
        for shape in &self.shapes {
            Self::trace(surface, &shape.path);
        }
        surface.clip();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Command, DisplayList};

    #[test]
    fn test_shapes_close_on_fill() {
        let mut g = Graphics::new();
        g.rect(0.0, 0.0, 10.0, 10.0).fill(Color::WHITE);
        g.move_to(0.0, 0.0).line_to(20.0, 5.0).stroke(Color::BLACK, 2.0);
        assert_eq!(g.shapes().len(), 2);
        assert_eq!(g.shapes()[0].fill, Some(Color::WHITE));

        // Nothing pending: no empty shape is recorded.
        g.fill(Color::BLACK);
        assert_eq!(g.shapes().len(), 2);
    }

    #[test]
    fn test_local_bounds() {
        let mut g = Graphics::new();
        g.rect(10.0, 10.0, 20.0, 5.0).fill(Color::WHITE);
        g.circle(0.0, 0.0, 4.0).fill(Color::WHITE);
        assert_eq!(g.local_bounds(), Some(Rectangle::new(-4.0, -4.0, 34.0, 19.0)));
        assert_eq!(Graphics::new().local_bounds(), None);
    }

    #[test]
    fn test_render_and_clip() {
        let mut g = Graphics::new();
        g.rect(0.0, 0.0, 10.0, 10.0).fill(Color::WHITE);

        let mut list = DisplayList::new(20, 20);
        g.render_me(&mut list);
        assert!(list
            .commands
            .iter()
            .any(|c| matches!(c, Command::FillPath { color, .. } if *color == Color::WHITE)));

        list.reset();
        assert!(g.clip_me(&mut list));
        assert!(list.commands.iter().any(|c| matches!(c, Command::Clip { .. })));
    }
}
