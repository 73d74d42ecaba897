use std::collections::BTreeMap;

use crate::math::Point3;

/// Distance scale of rounded-box vertices by the number of nonzero
/// lattice coordinates (face center, edge midpoint, corner).
const FACE_SCALE: f64 = 1.021_776;
const EDGE_SCALE: f64 = 0.741_912;
const CORNER_SCALE: f64 = 0.608_568;

/// Corner offsets of a cube face in the plane of the two other axes,
/// counter-clockwise around the positive axis.
const FACE_CORNERS: [(i8, i8); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

/// Creates the closed box used to skin a node without edges.
///
/// With `rounded` set, the box is one Catmull-Clark step of a cube
/// (26 vertices, 24 quads); otherwise it is a plain cube of half-extent
/// `radius` (8 vertices, 6 quads). Faces point outward.
pub struct MakeBox {
    center: Point3,
    radius: f64,
    rounded: bool,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, rounded: bool) -> Self {
        Self {
            center,
            radius,
            rounded,
        }
    }

    /// Picks the rounded variant for profiles with more than four points.
    #[must_use]
    pub fn for_template(center: Point3, radius: f64, template_len: usize) -> Self {
        Self::new(center, radius, template_len / 4 > 1)
    }

    /// Executes the operation, returning vertices and quad faces.
    #[must_use]
    pub fn execute(&self) -> (Vec<Point3>, Vec<Vec<usize>>) {
        if self.rounded {
            self.rounded_box()
        } else {
            self.cube()
        }
    }

    fn cube(&self) -> (Vec<Point3>, Vec<Vec<usize>>) {
        let mut lattice = Lattice::default();
        let mut faces = Vec::with_capacity(6);
        for (axis, sign) in face_directions() {
            let mut face: Vec<usize> = face_corners(axis, sign)
                .iter()
                .map(|corner| lattice.index(*corner))
                .collect();
            if sign < 0 {
                face.reverse();
            }
            faces.push(face);
        }
        let vertices = lattice
            .points
            .iter()
            .map(|p| self.center + p.map(f64::from) * self.radius)
            .collect();
        (vertices, faces)
    }

    fn rounded_box(&self) -> (Vec<Point3>, Vec<Vec<usize>>) {
        let mut lattice = Lattice::default();
        let mut faces = Vec::with_capacity(24);
        for (axis, sign) in face_directions() {
            let corners = face_corners(axis, sign);
            let mut center = [0_i8; 3];
            center[axis] = sign;
            let center = lattice.index(center);
            for k in 0..4 {
                let next = corners[(k + 1) % 4];
                let prev = corners[(k + 3) % 4];
                let mut quad = vec![
                    lattice.index(corners[k]),
                    lattice.index(midpoint(corners[k], next)),
                    center,
                    lattice.index(midpoint(prev, corners[k])),
                ];
                if sign < 0 {
                    quad.reverse();
                }
                faces.push(quad);
            }
        }
        let vertices = lattice
            .points
            .iter()
            .map(|p| {
                let scale = match p.iter().filter(|&&c| c != 0).count() {
                    1 => FACE_SCALE,
                    2 => EDGE_SCALE,
                    _ => CORNER_SCALE,
                };
                self.center + p.map(f64::from) * (scale * self.radius)
            })
            .collect();
        (vertices, faces)
    }
}

/// Integer lattice points in `{-1, 0, 1}^3`, deduplicated in first-use order.
#[derive(Default)]
struct Lattice {
    points: Vec<nalgebra::Vector3<i8>>,
    lookup: BTreeMap<[i8; 3], usize>,
}

impl Lattice {
    fn index(&mut self, key: [i8; 3]) -> usize {
        *self.lookup.entry(key).or_insert_with(|| {
            self.points.push(nalgebra::Vector3::from(key));
            self.points.len() - 1
        })
    }
}

fn face_directions() -> impl Iterator<Item = (usize, i8)> {
    (0..3).flat_map(|axis| [(axis, 1_i8), (axis, -1_i8)])
}

/// Corners of the face `sign * axis`, counter-clockwise around `+axis`.
fn face_corners(axis: usize, sign: i8) -> [[i8; 3]; 4] {
    let b = (axis + 1) % 3;
    let c = (axis + 2) % 3;
    FACE_CORNERS.map(|(db, dc)| {
        let mut p = [0_i8; 3];
        p[axis] = sign;
        p[b] = db;
        p[c] = dc;
        p
    })
}

fn midpoint(a: [i8; 3], b: [i8; 3]) -> [i8; 3] {
    [0, 1, 2].map(|i| (a[i] + b[i]) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::query::IsManifold;

    fn outward(vertices: &[Point3], faces: &[Vec<usize>], center: Point3) -> bool {
        faces.iter().all(|face| {
            let a = vertices[face[0]];
            let b = vertices[face[1]];
            let c = vertices[face[2]];
            let normal: Vector3 = (b - a).cross(&(c - a));
            let centroid = face.iter().map(|&i| vertices[i].coords).sum::<Vector3>()
                / face.len() as f64;
            normal.dot(&(centroid - center.coords)) > 0.0
        })
    }

    #[test]
    fn cube_is_closed_and_outward() {
        let center = Point3::new(1.0, 2.0, 3.0);
        let (vertices, faces) = MakeBox::new(center, 0.5, false).execute();
        assert_eq!(vertices.len(), 8);
        assert_eq!(faces.len(), 6);
        assert!(IsManifold::new(&faces).execute());
        assert!(outward(&vertices, &faces, center));
        for v in &vertices {
            assert!(((v - center).abs().max() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn rounded_box_is_closed_and_outward() {
        let center = Point3::origin();
        let (vertices, faces) = MakeBox::new(center, 2.0, true).execute();
        assert_eq!(vertices.len(), 26);
        assert_eq!(faces.len(), 24);
        assert!(IsManifold::new(&faces).execute());
        assert!(outward(&vertices, &faces, center));
        let extent = vertices.iter().map(|v| v.x).fold(f64::MIN, f64::max);
        assert!((extent - 2.0 * FACE_SCALE).abs() < 1e-9, "extent {extent}");
    }

    #[test]
    fn template_size_selects_variant() {
        let (quad, _) = MakeBox::for_template(Point3::origin(), 1.0, 4).execute();
        let (circle, _) = MakeBox::for_template(Point3::origin(), 1.0, 8).execute();
        assert_eq!(quad.len(), 8);
        assert_eq!(circle.len(), 26);
    }
}
