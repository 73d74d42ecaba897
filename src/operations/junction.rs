//! Branch junction wrapping.
//!
//! A junction emits one trimmed ring per incident edge and closes the
//! space between them with [`WrapLoops`]. When the wrap does not close or
//! is not manifold, the failing rings are pushed further out along their
//! edges and the wrap is retried. A ring that cannot move any further
//! swallows its degree-2 neighbor instead, taking over that neighbor's
//! other edge.

use std::collections::HashSet;

use tracing::debug;

use crate::graph::GraphSnapshot;
use crate::math::frame::try_unit;
use crate::math::{Vector3, TOLERANCE};
use crate::mesh::MeshBuffer;
use crate::skin::params::{WRAP_STEP_BACK_FACTOR, WRAP_WELD_FACTOR};

use super::cut::{CutFrame, MakeCut};
use super::query::IsManifold;
use super::stitch::{EdgeLoop, WrapLoops};

/// Stand-in separation for a neighbor sitting on top of the junction.
const MIN_SEPARATION: f64 = 1e-4;

/// A degree-2 neighbor spliced out of a junction's wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swallow {
    /// Junction slot whose edge was replaced.
    pub slot: usize,
    /// Edge between the junction and the swallowed node.
    pub edge: usize,
    /// The swallowed node.
    pub node: usize,
    /// The swallowed node's other edge, which now ends at the junction.
    pub replacement: usize,
}

/// Retry state of one junction.
///
/// Slot `i` starts as the junction's `i`-th incident edge. Swallowing only
/// rewrites this value; the graph snapshot is updated by the caller once a
/// wrap succeeds, so a failed junction leaves no trace.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapAttempt {
    /// Inset of each ring as a fraction of the free distance to its neighbor.
    pub offsets: Vec<f64>,
    /// Edge currently behind each slot.
    pub slot_edges: Vec<usize>,
    /// Neighbor currently behind each slot.
    pub slot_neighbors: Vec<usize>,
    /// Swallows performed so far, in order.
    pub swallows: Vec<Swallow>,
}

impl WrapAttempt {
    /// Starts with every ring at the junction radius and no swallows.
    #[must_use]
    pub fn new(graph: &GraphSnapshot, junction: usize) -> Self {
        let slot_edges = graph.incident[junction].clone();
        let slot_neighbors = slot_edges
            .iter()
            .map(|&edge| graph.other_end(edge, junction))
            .collect();
        Self {
            offsets: vec![0.0; slot_edges.len()],
            slot_edges,
            slot_neighbors,
            swallows: Vec::new(),
        }
    }

    fn is_swallowed(&self, edge: usize, committed: &HashSet<usize>) -> bool {
        committed.contains(&edge) || self.swallows.iter().any(|s| s.edge == edge)
    }

    /// Splices out the neighbor behind `slot`, redirecting the slot to the
    /// neighbor's other edge.
    ///
    /// Fails when the neighbor is not a pass-through node, when either edge
    /// has already been swallowed (here or in `committed`), or when the
    /// splice would land on the junction itself or on another slot's
    /// neighbor.
    pub fn swallow(
        &mut self,
        graph: &GraphSnapshot,
        junction: usize,
        slot: usize,
        committed: &HashSet<usize>,
    ) -> bool {
        let edge = self.slot_edges[slot];
        let neighbor = self.slot_neighbors[slot];
        if self.is_swallowed(edge, committed) || graph.degree(neighbor) != 2 {
            return false;
        }
        let Some(&replacement) = graph.incident[neighbor].iter().find(|&&e| e != edge) else {
            return false;
        };
        if self.is_swallowed(replacement, committed) {
            return false;
        }
        let next = graph.other_end(replacement, neighbor);
        if next == junction || self.slot_neighbors.contains(&next) {
            return false;
        }

        self.swallows.push(Swallow {
            slot,
            edge,
            node: neighbor,
            replacement,
        });
        self.slot_edges[slot] = replacement;
        self.slot_neighbors[slot] = next;
        true
    }
}

/// Result of wrapping one junction.
///
/// Everything except `attempts` is empty when the junction failed; the
/// caller commits the rest only on success.
#[derive(Debug, Clone, Default)]
pub struct JunctionOutcome {
    /// Whether a manifold wrap was found.
    pub succeeded: bool,
    /// Number of wrap attempts made.
    pub attempts: usize,
    /// Wrap faces.
    pub faces: Vec<Vec<usize>>,
    /// Ring of each slot, keyed by the edge it now sits on.
    pub edge_cuts: Vec<(usize, EdgeLoop)>,
    /// Near-coincident vertex pairs from different rings, `(from, to)`.
    pub welds: Vec<(usize, usize)>,
    /// Neighbors swallowed on the way to success.
    pub swallows: Vec<Swallow>,
}

/// Wraps the rings of one branch junction, retrying with larger insets and
/// swallowed neighbors until the wrap is manifold or nothing is left to try.
pub struct WrapJunction<'a> {
    graph: &'a GraphSnapshot,
    node: usize,
    base_normal: Vector3,
    traverse: &'a [Vector3],
    committed: Option<&'a HashSet<usize>>,
    step_back: f64,
    weld_factor: f64,
}

enum Step {
    Wrapped {
        faces: Vec<Vec<usize>>,
        edge_cuts: Vec<(usize, EdgeLoop)>,
        welds: Vec<(usize, usize)>,
    },
    Retry,
    Exhausted,
}

impl<'a> WrapJunction<'a> {
    /// Creates a new `WrapJunction` operation for `node`.
    #[must_use]
    pub fn new(
        graph: &'a GraphSnapshot,
        node: usize,
        base_normal: Vector3,
        traverse: &'a [Vector3],
    ) -> Self {
        Self {
            graph,
            node,
            base_normal,
            traverse,
            committed: None,
            step_back: WRAP_STEP_BACK_FACTOR,
            weld_factor: WRAP_WELD_FACTOR,
        }
    }

    /// Edges already swallowed by earlier junctions.
    #[must_use]
    pub fn with_swallowed_edges(mut self, edges: &'a HashSet<usize>) -> Self {
        self.committed = Some(edges);
        self
    }

    /// Sets the inset increment applied to failing rings.
    #[must_use]
    pub fn with_step_back(mut self, step_back: f64) -> Self {
        self.step_back = step_back;
        self
    }

    /// Sets the weld distance as a fraction of the junction radius.
    #[must_use]
    pub fn with_weld_factor(mut self, weld_factor: f64) -> Self {
        self.weld_factor = weld_factor;
        self
    }

    /// Executes the retry ladder, appending ring vertices to `buffer`.
    ///
    /// Vertices of failed attempts are removed again, so on failure the
    /// buffer is left as it was found.
    pub fn execute(&self, buffer: &mut MeshBuffer) -> JunctionOutcome {
        let empty = HashSet::new();
        let committed = self.committed.unwrap_or(&empty);
        let mut attempt = WrapAttempt::new(self.graph, self.node);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let start = buffer.vertex_count();
            match self.try_wrap(&mut attempt, committed, buffer) {
                Step::Wrapped {
                    faces,
                    edge_cuts,
                    welds,
                } => {
                    debug!(
                        node = self.node,
                        attempts,
                        swallowed = attempt.swallows.len(),
                        faces = faces.len(),
                        "junction wrapped"
                    );
                    return JunctionOutcome {
                        succeeded: true,
                        attempts,
                        faces,
                        edge_cuts,
                        welds,
                        swallows: attempt.swallows,
                    };
                }
                Step::Retry => buffer.truncate_vertices(start),
                Step::Exhausted => {
                    buffer.truncate_vertices(start);
                    return JunctionOutcome {
                        attempts,
                        ..JunctionOutcome::default()
                    };
                }
            }
        }
    }

    fn try_wrap(
        &self,
        attempt: &mut WrapAttempt,
        committed: &HashSet<usize>,
        buffer: &mut MeshBuffer,
    ) -> Step {
        let node = &self.graph.nodes[self.node];
        let slots = attempt.slot_edges.len();
        let mut changed = false;
        let mut direct_swallow = false;
        let mut rings: Vec<(Vec<usize>, Vector3)> = Vec::with_capacity(slots);

        // Step 1: one trimmed ring per slot.
        for slot in 0..slots {
            let neighbor = attempt.slot_neighbors[slot];
            let neighbor_radius = self.graph.radius(neighbor);
            let to_neighbor = self.graph.position(neighbor) - node.position;
            let mut distance = to_neighbor.norm();
            if distance < TOLERANCE {
                distance = MIN_SEPARATION;
            }
            let ray = try_unit(&to_neighbor).unwrap_or(self.traverse[self.node]);

            let radius_factor = 1.0 - node.radius / distance;
            let radius = (node.radius * radius_factor + neighbor_radius * (1.0 - radius_factor))
                .max(TOLERANCE);
            let inset =
                (attempt.offsets[slot] * (distance - node.radius - neighbor_radius)).max(0.0);
            let final_distance = node.radius + inset;
            if final_distance >= distance
                && attempt.swallow(self.graph, self.node, slot, committed)
            {
                debug!(node = self.node, slot, "neighbor within junction radius, swallowed");
                attempt.offsets[slot] = 0.0;
                changed = true;
                direct_swallow = true;
                continue;
            }

            let frame = CutFrame {
                base_normal: self.base_normal,
                cut_normal: ray,
                traverse_direction: self.traverse[neighbor],
            };
            let cut = MakeCut::new(
                node.position + ray * final_distance,
                radius,
                &node.cut_template,
                frame,
            )
            .with_rotation(node.cut_rotation)
            .execute();
            rings.push((buffer.push_ring(&cut.points, self.node, ray), ray));
        }
        if direct_swallow {
            return Step::Retry;
        }

        // Step 2: wrap, then check the cap together with its rings.
        let edge_loops: Vec<EdgeLoop> = rings
            .iter()
            .map(|(vertices, ray)| EdgeLoop::new(vertices.clone(), -*ray))
            .collect();
        let wrap_loops: Vec<EdgeLoop> = edge_loops.iter().map(EdgeLoop::reversed).collect();
        let result = WrapLoops::new(&wrap_loops).execute(&buffer.positions);
        let failed: Vec<usize> = if result.finished() {
            let mut test_faces = result.faces.clone();
            test_faces.extend(wrap_loops.iter().map(|l| l.vertices.clone()));
            if IsManifold::new(&test_faces).execute() {
                Vec::new()
            } else {
                (0..slots).collect()
            }
        } else {
            result.failed_loops.clone()
        };

        if failed.is_empty() {
            let welds = self.weld_pairs(&rings, buffer);
            let edge_cuts = attempt.slot_edges.iter().copied().zip(edge_loops).collect();
            return Step::Wrapped {
                faces: result.faces,
                edge_cuts,
                welds,
            };
        }

        // Step 3: step failing rings outward, or swallow once none can move.
        for &slot in &failed {
            if attempt.offsets[slot] + self.step_back < 1.0 {
                attempt.offsets[slot] += self.step_back;
                changed = true;
            }
        }
        if !changed {
            for &slot in &failed {
                if attempt.offsets[slot] + self.step_back >= 1.0
                    && attempt.swallow(self.graph, self.node, slot, committed)
                {
                    attempt.offsets[slot] = 0.0;
                    changed = true;
                    break;
                }
            }
        }
        debug!(node = self.node, ?failed, changed, "junction wrap rejected");
        if changed {
            Step::Retry
        } else {
            Step::Exhausted
        }
    }

    fn weld_pairs(&self, rings: &[(Vec<usize>, Vector3)], buffer: &MeshBuffer) -> Vec<(usize, usize)> {
        let threshold = self.graph.radius(self.node) * self.weld_factor;
        let threshold_squared = threshold * threshold;
        let mut welds = Vec::new();
        for (i, (first, _)) in rings.iter().enumerate() {
            for (second, _) in &rings[i + 1..] {
                for &u in first {
                    for &v in second {
                        let gap = buffer.positions[u] - buffer.positions[v];
                        if gap.norm_squared() < threshold_squared {
                            welds.push((v, u));
                        }
                    }
                }
            }
        }
        welds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::{quad_template, NodeData, NodeId, SkeletonGraph};
    use crate::math::Point3;
    use crate::operations::layout::{layout_nodes, resolve_traverse_directions};

    fn graph_of(points: &[(f64, f64, f64, f64)], edges: &[(usize, usize)]) -> SkeletonGraph {
        let mut graph = SkeletonGraph::new();
        let ids: Vec<NodeId> = points
            .iter()
            .map(|&(x, y, z, r)| {
                graph
                    .add_node(NodeData::new(Point3::new(x, y, z), r, quad_template()))
                    .unwrap()
            })
            .collect();
        for &(a, b) in edges {
            graph.add_edge(ids[a], ids[b]).unwrap();
        }
        graph
    }

    fn tripod() -> SkeletonGraph {
        let arm = |degrees: f64| {
            let (sin, cos) = degrees.to_radians().sin_cos();
            (3.0 * cos, 3.0 * sin, 0.0, 0.5)
        };
        graph_of(
            &[(0.0, 0.0, 0.0, 0.5), arm(0.0), arm(120.0), arm(240.0)],
            &[(0, 1), (0, 2), (0, 3)],
        )
    }

    #[test]
    fn planar_tripod_wraps_on_first_attempt() {
        let graph = tripod();
        let snapshot = graph.snapshot();
        let frames = resolve_traverse_directions(&snapshot, &layout_nodes(&snapshot));
        let mut buffer = MeshBuffer::new();
        let outcome =
            WrapJunction::new(&snapshot, 0, Vector3::z(), &frames.directions).execute(&mut buffer);

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.swallows.is_empty());
        assert_eq!(outcome.edge_cuts.len(), 3);
        assert_eq!(buffer.vertex_count(), 12);

        let mut faces = outcome.faces.clone();
        faces.extend(outcome.edge_cuts.iter().map(|(_, l)| l.reversed().vertices));
        assert!(IsManifold::new(&faces).execute());
        // Every ring sits one junction radius out along its edge.
        for (_, edge_loop) in &outcome.edge_cuts {
            let center = edge_loop
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, &v| acc + buffer.positions[v].coords)
                / 4.0;
            assert!((center.norm() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn swallow_redirects_slot_to_far_neighbor() {
        // 0 is the junction; 1 is a pass-through toward 4.
        let graph = graph_of(
            &[
                (0.0, 0.0, 0.0, 0.5),
                (1.0, 0.0, 0.0, 0.5),
                (-1.0, 1.0, 0.0, 0.5),
                (-1.0, -1.0, 0.0, 0.5),
                (3.0, 0.0, 0.0, 0.5),
            ],
            &[(0, 1), (0, 2), (0, 3), (1, 4)],
        );
        let snapshot = graph.snapshot();
        let committed = HashSet::new();
        let mut attempt = WrapAttempt::new(&snapshot, 0);
        assert_eq!(attempt.slot_neighbors, vec![1, 2, 3]);

        assert!(attempt.swallow(&snapshot, 0, 0, &committed));
        assert_eq!(attempt.slot_edges[0], 3);
        assert_eq!(attempt.slot_neighbors[0], 4);
        assert_eq!(
            attempt.swallows,
            vec![Swallow {
                slot: 0,
                edge: 0,
                node: 1,
                replacement: 3,
            }]
        );

        // Node 4 is an endpoint and leaves nothing to swallow.
        assert!(!attempt.swallow(&snapshot, 0, 0, &committed));
        // Endpoint neighbors are never swallowed.
        assert!(!attempt.swallow(&snapshot, 0, 1, &committed));
        // An edge swallowed by an earlier junction is off limits.
        let mut fresh = WrapAttempt::new(&snapshot, 0);
        assert!(!fresh.swallow(&snapshot, 0, 0, &HashSet::from([0])));
    }

    #[test]
    fn neighbor_inside_radius_is_swallowed_before_wrapping() {
        // Node 1 sits inside the junction's radius.
        let graph = graph_of(
            &[
                (0.0, 0.0, 0.0, 1.0),
                (0.8, 0.0, 0.0, 0.5),
                (-2.0, 3.0, 0.0, 0.5),
                (-2.0, -3.0, 0.0, 0.5),
                (4.0, 0.0, 0.0, 0.5),
            ],
            &[(0, 1), (0, 2), (0, 3), (1, 4)],
        );
        let snapshot = graph.snapshot();
        let frames = resolve_traverse_directions(&snapshot, &layout_nodes(&snapshot));
        let mut buffer = MeshBuffer::new();
        let outcome =
            WrapJunction::new(&snapshot, 0, Vector3::z(), &frames.directions).execute(&mut buffer);

        assert!(outcome.attempts >= 2);
        assert_eq!(outcome.swallows.len(), 1);
        assert_eq!(outcome.swallows[0].node, 1);
        assert!(outcome.succeeded);
        assert!(outcome.edge_cuts.iter().any(|(edge, _)| *edge == 3));
        assert!(!outcome.edge_cuts.iter().any(|(edge, _)| *edge == 0));
    }
}
