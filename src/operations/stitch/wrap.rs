use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::trace;

use super::{EdgeLoop, StitchResult};
use crate::math::frame::{degrees_between, plane_normal};
use crate::math::{Point3, Vector3};

/// Two triangle normals closer than this per component merge into a quad.
const COPLANAR_TOLERANCE: f64 = 0.01;

/// Closes the gap between boundary loops with an advancing front.
///
/// Each pending front edge picks the candidate vertex whose triangle
/// folds least against the face already behind the edge, emits that
/// triangle and pushes its two new edges as fronts. Coplanar triangle
/// pairs are merged into quads afterwards.
pub struct WrapLoops<'a> {
    loops: &'a [EdgeLoop],
}

impl<'a> WrapLoops<'a> {
    /// Creates a new `WrapLoops` operation.
    #[must_use]
    pub fn new(loops: &'a [EdgeLoop]) -> Self {
        Self { loops }
    }

    /// Executes the wrap over `positions`.
    #[must_use]
    pub fn execute(&self, positions: &[Point3]) -> StitchResult {
        let mut front = Front::default();
        for (plane, edge_loop) in self.loops.iter().enumerate() {
            front.add_loop(edge_loop, plane, positions);
        }
        front.generate();
        let failed_loops = front.failed_loops();
        trace!(
            loops = self.loops.len(),
            triangles = front.triangles.len(),
            failed = failed_loops.len(),
            "wrapped loops"
        );
        StitchResult {
            faces: front.finalize(),
            failed_loops,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Source {
    position: Point3,
    plane: usize,
    tag: usize,
}

#[derive(Debug, Clone, Copy)]
struct Item {
    p1: usize,
    p2: usize,
    base_normal: Vector3,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    corners: [usize; 3],
    normal: Vector3,
}

/// Which face owns a generated half-edge: `None` for loop boundary edges.
type Owner = Option<usize>;

#[derive(Debug, Default)]
struct Front {
    sources: Vec<Source>,
    candidates: Vec<usize>,
    items: Vec<Item>,
    item_keys: HashSet<(usize, usize)>,
    pending: Vec<usize>,
    half_edges: HashMap<(usize, usize), Owner>,
    adjacency: Vec<Vec<usize>>,
    triangles: Vec<Triangle>,
}

impl Front {
    fn add_loop(&mut self, edge_loop: &EdgeLoop, plane: usize, positions: &[Point3]) {
        let mut local: HashMap<usize, usize> = HashMap::new();
        for &tag in &edge_loop.vertices {
            if let std::collections::hash_map::Entry::Vacant(entry) = local.entry(tag) {
                let index = self.sources.len();
                self.sources.push(Source {
                    position: positions[tag],
                    plane,
                    tag,
                });
                self.candidates.push(index);
                self.adjacency.push(Vec::new());
                entry.insert(index);
            }
        }
        let ring: Vec<usize> = edge_loop.vertices.iter().map(|tag| local[tag]).collect();
        for (i, &current) in ring.iter().enumerate() {
            let next = ring[(i + 1) % ring.len()];
            if self.items.is_empty() {
                self.add_item(next, current, edge_loop.normal);
            }
            self.half_edges.insert((current, next), None);
        }
    }

    fn add_item(&mut self, p1: usize, p2: usize, base_normal: Vector3) {
        if !self.items.is_empty() && self.sources[p1].plane == self.sources[p2].plane {
            return;
        }
        if self.item_keys.contains(&(p1, p2)) || self.item_keys.contains(&(p2, p1)) {
            return;
        }
        if self.half_edges.contains_key(&(p1, p2)) || self.half_edges.contains_key(&(p2, p1)) {
            return;
        }
        self.pending.push(self.items.len());
        self.items.push(Item { p1, p2, base_normal });
        self.item_keys.insert((p1, p2));
    }

    fn is_edge_closed(&self, a: usize, b: usize) -> bool {
        self.half_edges.contains_key(&(a, b)) && self.half_edges.contains_key(&(b, a))
    }

    fn is_vertex_closed(&self, vertex: usize) -> bool {
        let edges = &self.adjacency[vertex];
        !edges.is_empty() && edges.iter().all(|&other| self.is_edge_closed(vertex, other))
    }

    /// Angle between the face behind the item and the candidate triangle,
    /// measured between their in-plane vectors perpendicular to the edge.
    fn fold_angle(&self, item: &Item, candidate: usize) -> f64 {
        if candidate == item.p1 || candidate == item.p2 {
            return 0.0;
        }
        let v1 = &self.sources[item.p1];
        let v2 = &self.sources[item.p2];
        let vp = &self.sources[candidate];
        if v1.plane == v2.plane && v1.plane == vp.plane {
            return 0.0;
        }
        let edge = v2.position - v1.position;
        let behind = edge.cross(&item.base_normal);
        let Some(normal) = plane_normal(&v2.position, &v1.position, &vp.position) else {
            return 0.0;
        };
        degrees_between(&edge.cross(&normal), &behind)
    }

    fn best_candidate(&mut self, item: &Item) -> Option<usize> {
        let closed: Vec<bool> = self
            .candidates
            .iter()
            .map(|&c| self.is_vertex_closed(c))
            .collect();
        let mut index = 0;
        self.candidates.retain(|_| {
            let keep = !closed[index];
            index += 1;
            keep
        });

        let mut best = None;
        let mut max_angle = 0.0;
        for &candidate in &self.candidates {
            if self.is_edge_closed(item.p1, candidate) || self.is_edge_closed(item.p2, candidate) {
                continue;
            }
            let angle = self.fold_angle(item, candidate);
            if angle > max_angle {
                max_angle = angle;
                best = Some(candidate);
            }
        }
        best
    }

    fn generate(&mut self) {
        while let Some(index) = self.pending.pop() {
            let item = self.items[index];
            let (p1, p2) = (item.p1, item.p2);
            if self.is_edge_closed(p1, p2) {
                continue;
            }
            let Some(p3) = self.best_candidate(&item) else {
                trace!(p1, p2, "no candidate for front edge");
                continue;
            };
            let normal = plane_normal(
                &self.sources[p1].position,
                &self.sources[p2].position,
                &self.sources[p3].position,
            )
            .unwrap_or_else(Vector3::zeros);
            let face = self.triangles.len();
            self.triangles.push(Triangle {
                corners: [p1, p2, p3],
                normal,
            });
            self.add_item(p3, p2, normal);
            self.add_item(p1, p3, normal);
            for (a, b) in [(p1, p2), (p2, p3), (p3, p1)] {
                self.half_edges.insert((a, b), Some(face));
            }
            for (vertex, first, second) in [(p1, p2, p3), (p2, p3, p1), (p3, p1, p2)] {
                self.adjacency[vertex].push(first);
                self.adjacency[vertex].push(second);
            }
        }
    }

    fn failed_loops(&self) -> Vec<usize> {
        let planes: BTreeSet<usize> = (0..self.sources.len())
            .filter(|&v| !self.is_vertex_closed(v))
            .map(|v| self.sources[v].plane)
            .collect();
        planes.into_iter().collect()
    }

    /// Emits triangles, merging coplanar neighbors into quads, and maps
    /// source indices back to the caller's vertex indices.
    fn finalize(&self) -> Vec<Vec<usize>> {
        let mut used = vec![false; self.triangles.len()];
        let mut triangles = Vec::new();
        let mut quads = Vec::new();
        for (index, triangle) in self.triangles.iter().enumerate() {
            if used[index] {
                continue;
            }
            used[index] = true;
            if let Some((paired, quad)) = self.find_pair(triangle, &used) {
                used[paired] = true;
                quads.push(quad);
            } else {
                triangles.push(triangle.corners.to_vec());
            }
        }
        triangles
            .into_iter()
            .chain(quads.into_iter().map(|q| q.to_vec()))
            .map(|face| face.iter().map(|&v| self.sources[v].tag).collect())
            .collect()
    }

    fn find_pair(&self, triangle: &Triangle, used: &[bool]) -> Option<(usize, [usize; 4])> {
        let c = triangle.corners;
        for i in 0..3 {
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            let Some(&Some(paired)) = self.half_edges.get(&(c[j], c[i])) else {
                continue;
            };
            if used[paired] {
                continue;
            }
            let other = &self.triangles[paired];
            let delta = other.normal - triangle.normal;
            if delta.iter().any(|d| d.abs() > COPLANAR_TOLERANCE) {
                continue;
            }
            let Some(&apex) = other.corners.iter().find(|&&v| v != c[i] && v != c[j]) else {
                continue;
            };
            return Some((paired, [c[i], apex, c[j], c[k]]));
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::query::IsManifold;

    /// Square ring in the plane `z`, winding toward `+Z` when `up`.
    fn square(positions: &mut Vec<Point3>, z: f64, size: f64, up: bool) -> EdgeLoop {
        let start = positions.len();
        let mut corners = vec![(size, size), (-size, size), (-size, -size), (size, -size)];
        if !up {
            corners.reverse();
        }
        for (x, y) in corners {
            positions.push(Point3::new(x, y, z));
        }
        let normal = if up { Vector3::z() } else { -Vector3::z() };
        EdgeLoop::new((start..start + 4).collect(), normal)
    }

    #[test]
    fn wraps_two_parallel_squares_into_closed_prism() {
        let mut positions = Vec::new();
        let bottom = square(&mut positions, 0.0, 1.0, false);
        let top = square(&mut positions, 1.0, 1.0, true);
        let loops = [bottom.clone(), top.clone()];
        let result = WrapLoops::new(&loops).execute(&positions);
        assert!(result.finished(), "failed loops {:?}", result.failed_loops);

        let mut faces = result.faces.clone();
        faces.push(bottom.vertices);
        faces.push(top.vertices);
        assert!(IsManifold::new(&faces).execute());
        // Each side is one planar quad.
        assert_eq!(result.faces.len(), 4);
        assert!(result.faces.iter().all(|f| f.len() == 4));
    }

    #[test]
    fn single_flat_loop_reports_failed_loop() {
        let positions = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let loops = [EdgeLoop::new(vec![0, 1, 2], Vector3::z())];
        let result = WrapLoops::new(&loops).execute(&positions);
        assert!(!result.finished());
        assert_eq!(result.failed_loops, vec![0]);
    }
}
