//! 2×3 affine matrix used for node world transforms.
//!
//! Layout (the bottom row `[0, 0, 1]` is implicit):
//! ```text
//! | a  c  tx |
//! | b  d  ty |
//! | 0  0  1  |
//! ```
//!
//! The matrix is a derived cache. Nodes keep their translate/scale/rotate/skew
//! as separate properties and rebuild the matrix from them every frame, so no
//! decomposition back into properties is ever needed.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation in radians.
    pub fn from_rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Reset to identity in place.
    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    /// Forward-transform a point.
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.tx,
            y: self.b * p.x + self.d * p.y + self.ty,
        }
    }

    /// Inverse-transform a point by solving the 2×2 system directly.
    ///
    /// A singular matrix (`a*d - c*b == 0`) is not reported: the division
    /// yields infinities and the result carries NaN/Infinity. Use
    /// [`Matrix::try_inverse`] when the caller needs to detect that case.
    pub fn apply_inverse(&self, p: Point) -> Point {
        let id = 1.0 / (self.a * self.d - self.c * self.b);
        Point {
            x: self.d * id * p.x - self.c * id * p.y + (self.ty * self.c - self.tx * self.d) * id,
            y: self.a * id * p.y - self.b * id * p.x + (self.tx * self.b - self.ty * self.a) * id,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.c * self.b
    }

    /// Inverse matrix, or `None` when the determinant is zero or not finite.
    pub fn try_inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let id = 1.0 / det;
        Some(Self {
            a: self.d * id,
            b: -self.b * id,
            c: -self.c * id,
            d: self.a * id,
            tx: (self.c * self.ty - self.d * self.tx) * id,
            ty: (self.b * self.tx - self.a * self.ty) * id,
        })
    }

    /// Post-translate.
    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    /// Post-scale (scales the translation as well).
    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.a *= x;
        self.d *= y;
        self.c *= x;
        self.b *= y;
        self.tx *= x;
        self.ty *= y;
        self
    }

    /// Post-rotate by `radians`.
    pub fn rotate(&mut self, radians: f64) -> &mut Self {
        let (sin, cos) = radians.sin_cos();
        let a1 = self.a;
        let c1 = self.c;
        let tx1 = self.tx;

        self.a = a1 * cos - self.b * sin;
        self.b = a1 * sin + self.b * cos;
        self.c = c1 * cos - self.d * sin;
        self.d = c1 * sin + self.d * cos;
        self.tx = tx1 * cos - self.ty * sin;
        self.ty = tx1 * sin + self.ty * cos;
        self
    }

    /// Right-multiply: `self = self * other`, so `other` applies first.
    pub fn append(&mut self, other: &Matrix) -> &mut Self {
        let (a1, b1, c1, d1) = (self.a, self.b, self.c, self.d);

        self.a = other.a * a1 + other.b * c1;
        self.b = other.a * b1 + other.b * d1;
        self.c = other.c * a1 + other.d * c1;
        self.d = other.c * b1 + other.d * d1;
        self.tx = other.tx * a1 + other.ty * c1 + self.tx;
        self.ty = other.tx * b1 + other.ty * d1 + self.ty;
        self
    }

    /// Left-multiply: `self = other * self`, so `other` applies last.
    pub fn prepend(&mut self, other: &Matrix) -> &mut Self {
        let mut m = *other;
        m.append(self);
        *self = m;
        self
    }

    /// Compose the local matrix of a posed node directly from its properties.
    ///
    /// Angles are in radians. The pivot is subtracted after scale/rotate/skew
    /// so that the pivot point lands on `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_transform(
        &mut self,
        x: f64,
        y: f64,
        pivot_x: f64,
        pivot_y: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
        skew_x: f64,
        skew_y: f64,
    ) -> &mut Self {
        let (sr, cr) = rotation.sin_cos();
        let (sy, cy) = skew_y.sin_cos();
        let nsx = -skew_x.sin();
        let cx = skew_x.cos();

        let a = cr * scale_x;
        let b = sr * scale_x;
        let c = -sr * scale_y;
        let d = cr * scale_y;

        self.a = cy * a + sy * c;
        self.b = cy * b + sy * d;
        self.c = nsx * a + cx * c;
        self.d = nsx * b + cx * d;
        self.tx = x - (pivot_x * self.a + pivot_y * self.c);
        self.ty = y - (pivot_x * self.b + pivot_y * self.d);
        self
    }

    /// Row-major 3×3 array, or column-major when `transpose` is set.
    pub fn to_array(&self, transpose: bool) -> [f64; 9] {
        if transpose {
            [self.a, self.b, 0.0, self.c, self.d, 0.0, self.tx, self.ty, 1.0]
        } else {
            [self.a, self.c, self.tx, self.b, self.d, self.ty, 0.0, 0.0, 1.0]
        }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.tx.is_finite()
            && self.ty.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn matrix_approx_eq(m: &Matrix, n: &Matrix) -> bool {
        approx_eq(m.a, n.a)
            && approx_eq(m.b, n.b)
            && approx_eq(m.c, n.c)
            && approx_eq(m.d, n.d)
            && approx_eq(m.tx, n.tx)
            && approx_eq(m.ty, n.ty)
    }

    #[test]
    fn test_apply_inverse_round_trip() {
        let mut m = Matrix::identity();
        m.set_transform(40.0, -12.0, 3.0, 7.0, 1.5, 0.5, 0.7, 0.1, -0.2);

        for p in [
            Point::new(0.0, 0.0),
            Point::new(13.5, -2.25),
            Point::new(-400.0, 1000.0),
        ] {
            let back = m.apply_inverse(m.apply(p));
            assert!((back.x - p.x).abs() < 1e-7, "{:?} vs {:?}", back, p);
            assert!((back.y - p.y).abs() < 1e-7, "{:?} vs {:?}", back, p);
        }
    }

    #[test]
    fn test_apply_inverse_singular_does_not_panic() {
        let m = Matrix::from_scale(0.0, 1.0);
        let p = m.apply_inverse(Point::new(1.0, 1.0));
        assert!(!p.x.is_finite() || p.x.is_nan());
        assert!(m.try_inverse().is_none());
    }

    #[test]
    fn test_try_inverse_matches_apply_inverse() {
        let mut m = Matrix::from_rotation(0.3);
        m.scale(2.0, 3.0).translate(5.0, 6.0);
        let inv = m.try_inverse().unwrap();
        let p = Point::new(9.0, -4.0);
        let a = inv.apply(p);
        let b = m.apply_inverse(p);
        assert!(approx_eq(a.x, b.x));
        assert!(approx_eq(a.y, b.y));
    }

    #[test]
    fn test_append_applies_other_first() {
        let mut m = Matrix::from_translation(10.0, 20.0);
        m.append(&Matrix::from_scale(2.0, 2.0));
        let p = m.apply(Point::new(1.0, 1.0));
        assert!(approx_eq(p.x, 12.0));
        assert!(approx_eq(p.y, 22.0));
    }

    #[test]
    fn test_prepend_applies_other_last() {
        let mut m = Matrix::from_translation(10.0, 20.0);
        m.prepend(&Matrix::from_scale(2.0, 2.0));
        let p = m.apply(Point::new(1.0, 1.0));
        assert!(approx_eq(p.x, 22.0));
        assert!(approx_eq(p.y, 42.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut m = Matrix::identity();
        m.rotate(std::f64::consts::FRAC_PI_2);
        let p = m.apply(Point::new(1.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 1.0));
    }

    #[test]
    fn test_set_transform_matches_composed_parts() {
        let mut m = Matrix::identity();
        m.set_transform(100.0, 50.0, 10.0, 5.0, 2.0, 3.0, 0.5, 0.0, 0.0);

        // T(x, y) * R * S * T(-pivot)
        let mut expected = Matrix::from_translation(100.0, 50.0);
        expected
            .append(&Matrix::from_rotation(0.5))
            .append(&Matrix::from_scale(2.0, 3.0))
            .append(&Matrix::from_translation(-10.0, -5.0));

        assert!(matrix_approx_eq(&m, &expected), "{:?} vs {:?}", m, expected);
    }

    #[test]
    fn test_to_array_layouts() {
        let m = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(m.to_array(false), [1.0, 3.0, 5.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert_eq!(m.to_array(true), [1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 5.0, 6.0, 1.0]);
    }
}
