//! Bezier curves for path motion.
//!
//! A curve is an ordered list of control points: the first and last are the
//! endpoints, everything in between pulls the curve. Any degree is accepted up
//! to [`MAX_CONTROL_POINTS`]; evaluation is de Casteljau on a scratch buffer,
//! so there is no recursion to bound.

use engine_core::Point;

/// Control points beyond this are dropped with a warning.
pub const MAX_CONTROL_POINTS: usize = 64;

/// Segments in the arc-length lookup table.
const LENGTH_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    points: Vec<Point>,
    /// Cumulative arc length at `i / LENGTH_SAMPLES`; empty until first used.
    lengths: Vec<f64>,
}

impl BezierCurve {
    pub fn new(mut points: Vec<Point>) -> Self {
        if points.len() > MAX_CONTROL_POINTS {
            tracing::warn!(
                count = points.len(),
                max = MAX_CONTROL_POINTS,
                "bezier curve truncated"
            );
            points.truncate(MAX_CONTROL_POINTS);
        }
        let mut curve = Self {
            points,
            lengths: Vec::new(),
        };
        curve.build_length_table();
        curve
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Point at parameter `t` (not clamped; extrapolates outside 0..=1).
    pub fn point_at(&self, t: f64) -> Point {
        match self.points.len() {
            0 => Point::ZERO,
            1 => self.points[0],
            2 => self.points[0].lerp(&self.points[1], t),
            _ => {
                let mut scratch = self.points.clone();
                for level in (1..scratch.len()).rev() {
                    for i in 0..level {
                        scratch[i] = scratch[i].lerp(&scratch[i + 1], t);
                    }
                }
                scratch[0]
            }
        }
    }

    /// Forward difference direction at `t`; zero-length for a degenerate
    /// curve.
    pub fn tangent_at(&self, t: f64, step: f64) -> Point {
        let p1 = self.point_at(t);
        let p2 = self.point_at(t + step);
        Point::new(p2.x - p1.x, p2.y - p1.y)
    }

    /// Total arc length from the sampled table.
    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at `ratio` of the total arc length, so equal ratio steps move
    /// equal distances along the curve.
    pub fn point_at_length(&self, ratio: f64) -> Point {
        let total = self.length();
        if total <= 0.0 {
            return self.point_at(ratio);
        }
        let target = ratio.clamp(0.0, 1.0) * total;
        // First sample whose cumulative length reaches the target.
        let idx = self.lengths.partition_point(|&l| l < target);
        if idx == 0 {
            return self.point_at(0.0);
        }
        let (l0, l1) = (self.lengths[idx - 1], self.lengths[idx]);
        let span = l1 - l0;
        let local = if span > 0.0 { (target - l0) / span } else { 0.0 };
        let t = ((idx - 1) as f64 + local) / LENGTH_SAMPLES as f64;
        self.point_at(t)
    }

    fn build_length_table(&mut self) {
        self.lengths.clear();
        if self.points.len() < 2 {
            return;
        }
        let mut acc = 0.0;
        let mut prev = self.point_at(0.0);
        self.lengths.push(0.0);
        for i in 1..=LENGTH_SAMPLES {
            let p = self.point_at(i as f64 / LENGTH_SAMPLES as f64);
            acc += prev.distance(&p);
            self.lengths.push(acc);
            prev = p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        let curve = BezierCurve::new(pts(&[(0.0, 0.0), (50.0, 100.0), (100.0, 0.0)]));
        assert_eq!(curve.point_at(0.0), Point::new(0.0, 0.0));
        assert_eq!(curve.point_at(1.0), Point::new(100.0, 0.0));
        let mid = curve.point_at(0.5);
        assert!(approx_eq(mid.x, 50.0));
        assert!(approx_eq(mid.y, 50.0));
    }

    #[test]
    fn test_cubic_matches_closed_form() {
        let p = pts(&[(0.0, 0.0), (10.0, 40.0), (60.0, 40.0), (80.0, 0.0)]);
        let curve = BezierCurve::new(p.clone());
        let t: f64 = 0.3;
        let mt = 1.0 - t;
        let expected_x = mt.powi(3) * p[0].x
            + 3.0 * mt * mt * t * p[1].x
            + 3.0 * mt * t * t * p[2].x
            + t.powi(3) * p[3].x;
        assert!(approx_eq(curve.point_at(t).x, expected_x));
    }

    #[test]
    fn test_degenerate_curves() {
        assert_eq!(BezierCurve::new(vec![]).point_at(0.5), Point::ZERO);
        let single = BezierCurve::new(pts(&[(3.0, 4.0)]));
        assert_eq!(single.point_at(0.7), Point::new(3.0, 4.0));
        assert_eq!(single.length(), 0.0);
        assert_eq!(single.tangent_at(0.5, 0.01), Point::ZERO);
    }

    #[test]
    fn test_length_mode_is_uniform_on_a_line() {
        // Control points bunched at the start make parametric speed uneven.
        let curve = BezierCurve::new(pts(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0), (90.0, 0.0)]));
        assert!((curve.length() - 90.0).abs() < 0.01);
        assert!(curve.point_at(0.5).x < 45.0);
        assert!((curve.point_at_length(0.5).x - 45.0).abs() < 1.0);
        assert!((curve.point_at_length(1.0).x - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncates_excess_points() {
        let many = (0..100).map(|i| Point::new(i as f64, 0.0)).collect();
        let curve = BezierCurve::new(many);
        assert_eq!(curve.points().len(), MAX_CONTROL_POINTS);
    }
}
