//! Joining boundary loops with faces.

mod wrap;

pub use wrap::WrapLoops;

use crate::math::{Point3, Vector3};

/// A closed boundary ring of mesh vertices.
///
/// `normal` is the winding normal of `vertices`, pointing away from the
/// surface that will be grown from the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLoop {
    /// Vertex indices in winding order.
    pub vertices: Vec<usize>,
    /// Winding normal.
    pub normal: Vector3,
}

impl EdgeLoop {
    /// Creates a new edge loop.
    #[must_use]
    pub fn new(vertices: Vec<usize>, normal: Vector3) -> Self {
        Self { vertices, normal }
    }

    /// The same ring traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self {
            vertices,
            normal: -self.normal,
        }
    }
}

/// Faces generated between loops, plus the loops that could not be closed.
#[derive(Debug, Clone, Default)]
pub struct StitchResult {
    /// New faces, triangles and quads.
    pub faces: Vec<Vec<usize>>,
    /// Indices of input loops that still have open vertices.
    pub failed_loops: Vec<usize>,
}

impl StitchResult {
    /// Returns `true` if every loop was closed.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.failed_loops.is_empty()
    }
}

/// Connects loops with a quad strip when there are exactly two of equal
/// size, and with the advancing-front wrapper otherwise.
pub struct StitchLoops<'a> {
    loops: &'a [EdgeLoop],
}

impl<'a> StitchLoops<'a> {
    /// Creates a new `StitchLoops` operation.
    #[must_use]
    pub fn new(loops: &'a [EdgeLoop]) -> Self {
        Self { loops }
    }

    /// Executes the stitch over `positions`.
    #[must_use]
    pub fn execute(&self, positions: &[Point3]) -> StitchResult {
        if let [a, b] = self.loops {
            if a.vertices.len() == b.vertices.len() && a.vertices.len() >= 3 {
                return StitchResult {
                    faces: stitch_by_quads(&a.vertices, &b.vertices, positions),
                    failed_loops: Vec::new(),
                };
            }
        }
        WrapLoops::new(self.loops).execute(positions)
    }
}

/// Quad strip between two facing rings of equal size.
///
/// Both rings wind away from the strip. Ring `b` runs opposite to `a`, so
/// `a[i]` pairs with `b[(k - i) mod n]` for the offset `k` with the least
/// summed squared bridge length.
fn stitch_by_quads(a: &[usize], b: &[usize], positions: &[Point3]) -> Vec<Vec<usize>> {
    let n = a.len();
    let partner = |k: usize, i: usize| b[(k + n - i % n) % n];
    let cost = |k: usize| -> f64 {
        (0..n)
            .map(|i| (positions[partner(k, i)] - positions[a[i]]).norm_squared())
            .sum()
    };
    let mut best = 0;
    let mut best_cost = cost(0);
    for k in 1..n {
        let c = cost(k);
        if c < best_cost {
            best = k;
            best_cost = c;
        }
    }
    (0..n)
        .map(|i| {
            vec![
                a[(i + 1) % n],
                a[i],
                partner(best, i),
                partner(best, i + 1),
            ]
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::query::IsManifold;

    /// Two square rings facing away from each other along Z.
    fn facing_squares(shift: usize) -> (Vec<Point3>, EdgeLoop, EdgeLoop) {
        let corners = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        let mut positions = Vec::new();
        // Bottom ring: clockwise seen from +Z, so it winds toward -Z.
        for &(x, y) in corners.iter().rev() {
            positions.push(Point3::new(x, y, 0.0));
        }
        // Top ring: counter-clockwise seen from +Z, rotated by `shift`.
        for i in 0..4 {
            let (x, y) = corners[(i + shift) % 4];
            positions.push(Point3::new(x, y, 2.0));
        }
        let bottom = EdgeLoop::new(vec![0, 1, 2, 3], -Vector3::z());
        let top = EdgeLoop::new(vec![4, 5, 6, 7], Vector3::z());
        (positions, bottom, top)
    }

    #[test]
    fn quad_stitch_closes_tube_with_caps() {
        for shift in 0..4 {
            let (positions, bottom, top) = facing_squares(shift);
            let loops = [bottom.clone(), top.clone()];
            let result = StitchLoops::new(&loops).execute(&positions);
            assert!(result.finished());
            assert_eq!(result.faces.len(), 4);

            let mut faces = result.faces.clone();
            faces.push(bottom.vertices.clone());
            faces.push(top.vertices.clone());
            assert!(IsManifold::new(&faces).execute(), "shift {shift}");

            // Every bridge is vertical: aligned partners share x and y.
            for face in &result.faces {
                let low = positions[face[1]];
                let high = positions[face[2]];
                assert!((low.x - high.x).abs() < 1e-12 && (low.y - high.y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn unequal_loops_use_wrapper() {
        let (mut positions, bottom, _) = facing_squares(0);
        // Triangle on top, counter-clockwise seen from +Z.
        positions.push(Point3::new(1.0, 0.0, 2.0));
        positions.push(Point3::new(-0.5, 0.8, 2.0));
        positions.push(Point3::new(-0.5, -0.8, 2.0));
        let top = EdgeLoop::new(vec![8, 9, 10], Vector3::z());
        let loops = [bottom, top];
        let result = StitchLoops::new(&loops).execute(&positions);

        // The quad path emits exactly one quad per ring edge; the wrapper
        // produces its own mix of triangles and quads.
        assert!(!result.faces.is_empty());
        assert!(result.faces.iter().all(|f| f.len() == 3 || f.len() == 4));
        assert!(result.faces.iter().flatten().all(|&v| v < positions.len()));
        assert!(result.faces.iter().any(|f| f.iter().any(|&v| v >= 8)));
    }

    #[test]
    fn reversed_loop_negates_normal() {
        let edge_loop = EdgeLoop::new(vec![0, 1, 2], Vector3::z());
        let reversed = edge_loop.reversed();
        assert_eq!(reversed.vertices, vec![2, 1, 0]);
        assert_eq!(reversed.normal, -Vector3::z());
    }
}
