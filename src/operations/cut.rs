use crate::math::frame::try_unit;
use crate::math::{Point2, Point3, Rotation3, Vector3};

use super::normal::revise_base_normal;

/// Orientation inputs of a cross-section.
#[derive(Debug, Clone, Copy)]
pub struct CutFrame {
    /// Reference "up" vector of the node.
    pub base_normal: Vector3,
    /// Direction the ring faces, usually along an incident edge.
    pub cut_normal: Vector3,
    /// Travel direction of the node that owns the ring.
    pub traverse_direction: Vector3,
}

/// Affine mapping from template space to the emitted ring.
///
/// A template point `(x, y)` lands at
/// `translation + rotation * (u_factor * x + v_factor * y)`, with the
/// template reversed first when `reverse` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutTransform {
    /// Ring center.
    pub translation: Point3,
    /// Ring radius.
    pub scale: f64,
    /// Extra rotation about the final cut normal.
    pub rotation: Rotation3,
    /// Template X axis, already scaled by the radius.
    pub u_factor: Vector3,
    /// Template Y axis, already scaled by the radius.
    pub v_factor: Vector3,
    /// Whether the template order was reversed (keeping the first point).
    pub reverse: bool,
}

impl CutTransform {
    /// Maps one template point into world space.
    #[must_use]
    pub fn apply(&self, point: &Point2) -> Point3 {
        self.translation + self.rotation * (self.u_factor * point.x + self.v_factor * point.y)
    }
}

/// Ring produced by [`MakeCut`].
#[derive(Debug, Clone)]
pub struct Cut {
    /// Ring vertices; their winding normal is the negated input cut normal.
    pub points: Vec<Point3>,
    /// Transform that produced the ring.
    pub transform: CutTransform,
    /// Whether the cut normal was flipped to agree with the traverse direction.
    pub flipped: bool,
    /// Base normal after revision and flipping.
    pub base_normal: Vector3,
}

/// Builds one cross-section ring from a node's profile template.
pub struct MakeCut<'a> {
    center: Point3,
    radius: f64,
    template: &'a [Point2],
    frame: CutFrame,
    rotation: f64,
}

impl<'a> MakeCut<'a> {
    /// Creates a new `MakeCut` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, template: &'a [Point2], frame: CutFrame) -> Self {
        Self {
            center,
            radius,
            template,
            frame,
            rotation: 0.0,
        }
    }

    /// Rotates the profile by `rotation * 180` degrees about the cut normal.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Executes the operation.
    #[must_use]
    pub fn execute(&self) -> Cut {
        let frame = &self.frame;
        let mut cut_normal = try_unit(&frame.cut_normal)
            .or_else(|| try_unit(&frame.traverse_direction))
            .unwrap_or_else(Vector3::y);
        let mut base_normal = revise_base_normal(&frame.base_normal, &cut_normal);
        let mut degrees = self.rotation * 180.0;

        let flipped = cut_normal.dot(&frame.traverse_direction) <= 0.0;
        if flipped {
            cut_normal = -cut_normal;
            base_normal = -base_normal;
            degrees += 180.0;
        }

        let u = try_unit(&cut_normal.cross(&base_normal)).unwrap_or_else(Vector3::x);
        let v = try_unit(&u.cross(&cut_normal)).unwrap_or_else(Vector3::y);
        let rotation = Rotation3::from_axis_angle(
            &nalgebra::Unit::new_normalize(cut_normal),
            degrees.to_radians(),
        );
        let transform = CutTransform {
            translation: self.center,
            scale: self.radius,
            rotation,
            u_factor: u * self.radius,
            v_factor: v * self.radius,
            reverse: flipped,
        };

        let mut template = self.template.to_vec();
        if flipped && template.len() > 1 {
            template[1..].reverse();
        }
        let points = template.iter().map(|p| transform.apply(p)).collect();

        Cut {
            points,
            transform,
            flipped,
            base_normal: rotation * base_normal,
        }
    }
}
