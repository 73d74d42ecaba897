//! Small vector helpers shared by the frame and wrapping code.

use super::{Point3, Vector3, TOLERANCE};

/// Normalizes `v`, returning `None` for (near) zero or non-finite vectors.
#[must_use]
pub fn try_unit(v: &Vector3) -> Option<Vector3> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    v.try_normalize(TOLERANCE)
}

/// Unit normal of the plane through three points, following the
/// right-hand rule over `a -> b -> c`.
#[must_use]
pub fn plane_normal(a: &Point3, b: &Point3, c: &Point3) -> Option<Vector3> {
    try_unit(&(b - a).cross(&(c - a)))
}

/// Unsigned angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns `0.0` when either vector is degenerate.
#[must_use]
pub fn degrees_between(a: &Vector3, b: &Vector3) -> f64 {
    match (try_unit(a), try_unit(b)) {
        (Some(a), Some(b)) => a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

/// Angle from `a` to `b` in degrees, in `[0, 360)`, measured
/// counter-clockwise around `plane_normal`.
#[must_use]
pub fn degrees_around(a: &Vector3, b: &Vector3, plane_normal: &Vector3) -> f64 {
    let degrees = degrees_between(a, b);
    if a.cross(b).dot(plane_normal) < 0.0 {
        360.0 - degrees
    } else {
        degrees
    }
}

/// Returns the dominant axis index (0=X, 1=Y, 2=Z) and whether
/// the vector points in the positive direction along that axis.
#[must_use]
pub fn dominant_axis(v: &Vector3) -> (usize, bool) {
    let ax = v.x.abs();
    let ay = v.y.abs();
    let az = v.z.abs();
    if ax >= ay && ax >= az {
        (0, v.x > 0.0)
    } else if ay >= az {
        (1, v.y > 0.0)
    } else {
        (2, v.z > 0.0)
    }
}

/// Unit vector along the given axis index.
#[must_use]
pub fn axis(index: usize) -> Vector3 {
    match index % 3 {
        0 => Vector3::x(),
        1 => Vector3::y(),
        _ => Vector3::z(),
    }
}

/// Deterministic normal perpendicular to `direction`.
///
/// Crosses the direction with the axis following its dominant axis and
/// flips the result when the direction points down that dominant axis.
#[must_use]
pub fn axis_derived_normal(direction: &Vector3) -> Vector3 {
    let (index, positive) = dominant_axis(direction);
    let normal = try_unit(&direction.cross(&axis(index + 1))).unwrap_or_else(Vector3::z);
    if positive {
        normal
    } else {
        -normal
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_normal_follows_winding() {
        let n = plane_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(n, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn plane_normal_of_collinear_points_is_none() {
        let n = plane_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!(n.is_none());
    }

    #[test]
    fn degrees_around_wraps_past_180() {
        let a = Vector3::x();
        let b = -Vector3::y();
        assert_relative_eq!(degrees_around(&a, &b, &Vector3::z()), 270.0, epsilon = 1e-9);
        assert_relative_eq!(degrees_around(&a, &Vector3::y(), &Vector3::z()), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn axis_derived_normal_is_perpendicular() {
        for dir in [
            Vector3::new(0.2, 1.0, 0.1),
            Vector3::new(-1.0, 0.3, 0.0),
            Vector3::new(0.0, 0.0, -2.0),
        ] {
            let n = axis_derived_normal(&dir);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
            assert!(n.dot(&dir.normalize()).abs() < 1e-12);
        }
    }

    #[test]
    fn try_unit_rejects_nan() {
        assert!(try_unit(&Vector3::new(f64::NAN, 0.0, 1.0)).is_none());
        assert!(try_unit(&Vector3::zeros()).is_none());
    }
}
