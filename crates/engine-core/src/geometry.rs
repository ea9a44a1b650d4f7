//! Value geometry: points, hit-test shapes and axis-aligned bounds.
//!
//! Every shape answers `contains(x, y)` in its own local, untransformed space.
//! Callers that hold a world-space point are responsible for mapping it back
//! through the owning node's world transform first.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::matrix::Matrix;

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const EMPTY: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Zero-area rectangles never contain anything.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Circle by center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.radius <= 0.0 {
            return false;
        }
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            self.x - self.radius,
            self.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// Ellipse by center and half-axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    pub half_width: f64,
    pub half_height: f64,
}

impl Ellipse {
    pub fn new(x: f64, y: f64, half_width: f64, half_height: f64) -> Self {
        Self {
            x,
            y,
            half_width,
            half_height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.half_width <= 0.0 || self.half_height <= 0.0 {
            return false;
        }
        let nx = (x - self.x) / self.half_width;
        let ny = (y - self.y) / self.half_height;
        nx * nx + ny * ny <= 1.0
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            self.x - self.half_width,
            self.y - self.half_height,
            self.half_width * 2.0,
            self.half_height * 2.0,
        )
    }
}

/// Closed polygon; the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build from a flat `[x0, y0, x1, y1, ...]` list.
    pub fn from_flat(coords: &[f64]) -> Result<Self, CoreError> {
        if coords.len() % 2 != 0 {
            return Err(CoreError::OddCoordinateCount(coords.len()));
        }
        let points: Vec<Point> = coords
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        if points.len() < 3 {
            return Err(CoreError::TooFewVertices(points.len()));
        }
        Ok(Self { points })
    }

    /// Even-odd ray casting.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.points[i].x, self.points[i].y);
            let (xj, yj) = (self.points[j].x, self.points[j].y);
            let intersect = ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi);
            if intersect {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn bounds(&self) -> Rectangle {
        let mut bounds = Bounds::new();
        for p in &self.points {
            bounds.add_point(p.x, p.y);
        }
        bounds.rectangle()
    }
}

/// Shape a node uses for hit testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitArea {
    Rectangle(Rectangle),
    Circle(Circle),
    Ellipse(Ellipse),
    Polygon(Polygon),
}

impl HitArea {
    /// Containment in the shape's local space.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            HitArea::Rectangle(r) => r.contains(x, y),
            HitArea::Circle(c) => c.contains(x, y),
            HitArea::Ellipse(e) => e.contains(x, y),
            HitArea::Polygon(p) => p.contains(x, y),
        }
    }

    pub fn bounds(&self) -> Rectangle {
        match self {
            HitArea::Rectangle(r) => *r,
            HitArea::Circle(c) => c.bounds(),
            HitArea::Ellipse(e) => e.bounds(),
            HitArea::Polygon(p) => p.bounds(),
        }
    }
}

impl From<Rectangle> for HitArea {
    fn from(r: Rectangle) -> Self {
        HitArea::Rectangle(r)
    }
}

impl From<Circle> for HitArea {
    fn from(c: Circle) -> Self {
        HitArea::Circle(c)
    }
}

impl From<Ellipse> for HitArea {
    fn from(e: Ellipse) -> Self {
        HitArea::Ellipse(e)
    }
}

impl From<Polygon> for HitArea {
    fn from(p: Polygon) -> Self {
        HitArea::Polygon(p)
    }
}

/// Accumulating axis-aligned box in world space.
///
/// A freshly cleared box is inverted (`min > max`) so the first point added
/// defines it; `is_empty` reports that state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Add the four transformed corners of a local rectangle.
    pub fn add_frame(&mut self, transform: &Matrix, rect: &Rectangle) {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        for (x, y) in corners {
            let p = transform.apply(Point::new(x, y));
            self.add_point(p.x, p.y);
        }
    }

    /// Union with another box; empty boxes are ignored.
    pub fn add_bounds(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn rectangle(&self) -> Rectangle {
        if self.is_empty() {
            return Rectangle::EMPTY;
        }
        Rectangle::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_contains_is_half_open() {
        let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(r.contains(9.99, 9.99));
        assert!(!r.contains(10.0, 5.0));
        assert!(!Rectangle::new(0.0, 0.0, 0.0, 10.0).contains(0.0, 0.0));
    }

    #[test]
    fn test_circle_and_ellipse() {
        let c = Circle::new(5.0, 5.0, 2.0);
        assert!(c.contains(6.0, 6.0));
        assert!(!c.contains(8.0, 5.0));

        let e = Ellipse::new(0.0, 0.0, 4.0, 1.0);
        assert!(e.contains(3.9, 0.0));
        assert!(!e.contains(0.0, 1.5));
    }

    #[test]
    fn test_polygon_concave() {
        // An "L" shape.
        let p = Polygon::from_flat(&[0.0, 0.0, 10.0, 0.0, 10.0, 2.0, 2.0, 2.0, 2.0, 10.0, 0.0, 10.0])
            .unwrap();
        assert!(p.contains(1.0, 8.0));
        assert!(p.contains(8.0, 1.0));
        assert!(!p.contains(8.0, 8.0));
        assert_eq!(p.bounds(), Rectangle::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_polygon_rejects_malformed_input() {
        assert!(matches!(
            Polygon::from_flat(&[0.0, 1.0, 2.0]),
            Err(CoreError::OddCoordinateCount(3))
        ));
        assert!(matches!(
            Polygon::from_flat(&[0.0, 0.0, 1.0, 1.0]),
            Err(CoreError::TooFewVertices(2))
        ));
    }

    #[test]
    fn test_bounds_union_ignores_empty() {
        let mut a = Bounds::new();
        assert!(a.is_empty());
        a.add_frame(&Matrix::identity(), &Rectangle::new(0.0, 0.0, 10.0, 10.0));

        let mut b = Bounds::new();
        b.add_frame(
            &Matrix::from_translation(20.0, 5.0),
            &Rectangle::new(0.0, 0.0, 5.0, 5.0),
        );

        a.add_bounds(&b);
        a.add_bounds(&Bounds::new());
        assert_eq!(a.rectangle(), Rectangle::new(0.0, 0.0, 25.0, 10.0));
    }
}
