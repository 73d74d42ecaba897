//! Cut templates: unit 2D profiles swept along the skeleton.

use std::f64::consts::TAU;

use crate::math::{Point2, TOLERANCE};

/// Square profile with corners at `(+-1, +-1)`, counter-clockwise.
#[must_use]
pub fn quad_template() -> Vec<Point2> {
    vec![
        Point2::new(-1.0, -1.0),
        Point2::new(1.0, -1.0),
        Point2::new(1.0, 1.0),
        Point2::new(-1.0, 1.0),
    ]
}

/// Regular polygon inscribed in the unit circle, counter-clockwise,
/// starting at `(1, 0)`.
///
/// Fewer than 3 sides are clamped to 3.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle_template(sides: usize) -> Vec<Point2> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| {
            let angle = TAU * i as f64 / sides as f64;
            Point2::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Twice the signed area of a 2D polygon (positive when counter-clockwise).
#[must_use]
pub fn signed_area_2x(points: &[Point2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Centers a free-form profile on its bounding box, scales its longer
/// side to span `[-1, 1]`, and makes it counter-clockwise while keeping
/// the first point first.
#[must_use]
pub fn normalize_template(points: &[Point2]) -> Vec<Point2> {
    if points.is_empty() {
        return Vec::new();
    }
    let (mut x_low, mut x_high) = (f64::MAX, f64::MIN);
    let (mut y_low, mut y_high) = (f64::MAX, f64::MIN);
    for p in points {
        x_low = x_low.min(p.x);
        x_high = x_high.max(p.x);
        y_low = y_low.min(p.y);
        y_high = y_high.max(p.y);
    }
    let x_mid = (x_high + x_low) * 0.5;
    let y_mid = (y_high + y_low) * 0.5;
    let mut long_side = (x_high - x_low).max(y_high - y_low);
    if long_side < TOLERANCE {
        long_side = 1e-6;
    }
    let mut normalized: Vec<Point2> = points
        .iter()
        .map(|p| Point2::new((p.x - x_mid) * 2.0 / long_side, (p.y - y_mid) * 2.0 / long_side))
        .collect();
    if signed_area_2x(&normalized) < 0.0 {
        normalized[1..].reverse();
    }
    normalized
}
