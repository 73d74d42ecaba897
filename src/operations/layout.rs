//! Node ordering and traverse direction resolution.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::graph::GraphSnapshot;
use crate::math::frame::{dominant_axis, try_unit};
use crate::math::Vector3;

/// Per-node traverse direction and depth-first rank.
#[derive(Debug, Clone)]
pub struct TraverseFrames {
    /// Unit travel direction of each node.
    pub directions: Vec<Vector3>,
    /// Pre-order index of each node in the depth-first walk.
    pub ranks: Vec<usize>,
}

impl TraverseFrames {
    /// Node indices sorted by rank.
    #[must_use]
    pub fn rank_order(&self) -> Vec<usize> {
        let mut order = vec![0; self.ranks.len()];
        for (node, &rank) in self.ranks.iter().enumerate() {
            order[rank] = node;
        }
        order
    }
}

/// Orders nodes so that junctions come first and chains follow in a
/// deterministic walk order.
///
/// Junctions (degree >= 3) are sorted by descending degree, descending
/// radius, then position (y, z, x descending). The remaining nodes follow
/// the breadth-first walks started at each degree-1 node, leftovers last,
/// and the whole run is reversed if it heads down its dominant axis.
/// Without any degree-1 node the identity order is returned.
#[must_use]
pub fn layout_nodes(graph: &GraphSnapshot) -> Vec<usize> {
    let count = graph.node_count();
    let identity: Vec<usize> = (0..count).collect();
    if !identity.iter().any(|&n| graph.degree(n) == 1) {
        return identity;
    }

    let mut junctions: Vec<usize> = identity
        .iter()
        .copied()
        .filter(|&n| graph.degree(n) >= 3)
        .collect();
    junctions.sort_by(|&a, &b| compare_junctions(graph, a, b));

    let mut visited = vec![false; count];
    let mut recorded = vec![false; count];
    let mut chain = Vec::with_capacity(count - junctions.len());
    for start in identity.iter().copied().filter(|&n| graph.degree(n) == 1) {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if graph.degree(node) <= 2 {
                recorded[node] = true;
                chain.push(node);
            }
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }
    chain.extend(
        identity
            .iter()
            .copied()
            .filter(|&n| graph.degree(n) <= 2 && !recorded[n]),
    );

    if let (Some(&first), Some(&last)) = (chain.first(), chain.last()) {
        let displacement = graph.position(last) - graph.position(first);
        let (axis, _) = dominant_axis(&displacement);
        if displacement[axis] < 0.0 {
            chain.reverse();
        }
    }

    junctions.extend(chain);
    junctions
}

fn compare_junctions(graph: &GraphSnapshot, a: usize, b: usize) -> Ordering {
    let (pa, pb) = (graph.position(a), graph.position(b));
    graph
        .degree(b)
        .cmp(&graph.degree(a))
        .then_with(|| graph.radius(b).total_cmp(&graph.radius(a)))
        .then_with(|| pb.y.total_cmp(&pa.y))
        .then_with(|| pb.z.total_cmp(&pa.z))
        .then_with(|| pb.x.total_cmp(&pa.x))
        .then_with(|| a.cmp(&b))
}

/// Resolves traverse directions and ranks with an iterative depth-first
/// walk started from each unvisited node in reverse `order`.
///
/// Non-root nodes point away from their walk parent, roots borrow the
/// direction of their first neighbor, and degree-2 nodes average their own
/// direction with that of their higher-ranked neighbor.
#[must_use]
pub fn resolve_traverse_directions(graph: &GraphSnapshot, order: &[usize]) -> TraverseFrames {
    let count = graph.node_count();
    let mut ranks = vec![0; count];
    let mut initial: Vec<Option<Vector3>> = vec![None; count];
    let mut visited = vec![false; count];
    let mut next_rank = 0;

    for &root in order.iter().rev() {
        let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            ranks[node] = next_rank;
            next_rank += 1;
            if let Some(parent) = parent {
                initial[node] = try_unit(&(graph.position(node) - graph.position(parent)));
            }
            let neighbors: Vec<usize> = graph.neighbors(node).collect();
            for &neighbor in neighbors.iter().rev() {
                if !visited[neighbor] {
                    stack.push((neighbor, Some(node)));
                }
            }
        }
    }

    let initial: Vec<Vector3> = (0..count)
        .map(|node| {
            initial[node]
                .or_else(|| graph.neighbors(node).next().and_then(|n| initial[n]))
                .unwrap_or_else(Vector3::y)
        })
        .collect();

    let directions = (0..count)
        .map(|node| {
            if graph.degree(node) != 2 {
                return initial[node];
            }
            let later = graph
                .neighbors(node)
                .max_by_key(|&n| ranks[n])
                .unwrap_or(node);
            try_unit(&(initial[node] + initial[later])).unwrap_or(initial[node])
        })
        .collect();

    TraverseFrames { directions, ranks }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::{quad_template, NodeData, NodeId, SkeletonGraph};
    use crate::math::Point3;
    use approx::assert_relative_eq;

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

    #[test]
    fn junctions_come_first_by_degree_then_radius() {
        // Two junctions: node 0 (degree 3, r 1) and node 4 (degree 4, r 0.5).
        let graph = graph_of(
            &[
                (0.0, 0.0, 0.0, 1.0),
                (1.0, 0.0, 0.0, 0.3),
                (-1.0, 0.0, 0.0, 0.3),
                (0.0, -1.0, 0.0, 0.3),
                (0.0, 3.0, 0.0, 0.5),
                (1.0, 3.0, 0.0, 0.3),
                (-1.0, 3.0, 0.0, 0.3),
                (0.0, 4.0, 0.0, 0.3),
            ],
            &[(0, 1), (0, 2), (1, 3), (0, 4), (4, 5), (4, 6), (4, 7)],
        );
        let order = layout_nodes(&graph.snapshot());
        assert_eq!(&order[..2], &[4, 0]);
        assert_eq!(order.len(), 8);
    }

    #[test]
    fn chain_runs_along_positive_axis() {
        // Chain inserted from +x to -x; the walk must be reversed.
        let graph = graph_of(
            &[
                (2.0, 0.0, 0.0, 0.5),
                (1.0, 0.0, 0.0, 0.5),
                (0.0, 0.0, 0.0, 0.5),
            ],
            &[(0, 1), (1, 2)],
        );
        assert_eq!(layout_nodes(&graph.snapshot()), vec![2, 1, 0]);
    }

    #[test]
    fn ring_keeps_identity_order() {
        let graph = graph_of(
            &[
                (0.0, 0.0, 0.0, 0.5),
                (1.0, 0.0, 0.0, 0.5),
                (0.0, 1.0, 0.0, 0.5),
            ],
            &[(0, 1), (1, 2), (2, 0)],
        );
        assert_eq!(layout_nodes(&graph.snapshot()), vec![0, 1, 2]);
    }

    #[test]
    fn chain_directions_follow_the_walk() {
        let graph = graph_of(
            &[
                (0.0, 0.0, 0.0, 0.5),
                (1.0, 0.0, 0.0, 0.5),
                (2.0, 1.0, 0.0, 0.5),
            ],
            &[(0, 1), (1, 2)],
        );
        let snapshot = graph.snapshot();
        let order = layout_nodes(&snapshot);
        let frames = resolve_traverse_directions(&snapshot, &order);

        // The walk starts at the last node of the layout, node 2.
        assert_eq!(frames.ranks[2], 0);
        assert_eq!(frames.rank_order(), vec![2, 1, 0]);
        assert_relative_eq!(frames.directions[0], -Vector3::x(), epsilon = 1e-12);
        // Root inherits its only neighbor's direction.
        let from_two = (Point3::new(1.0, 0.0, 0.0) - Point3::new(2.0, 1.0, 0.0)).normalize();
        assert_relative_eq!(frames.directions[2], from_two, epsilon = 1e-12);
        // The middle node blends its own direction with its child's.
        let blended = (from_two - Vector3::x()).normalize();
        assert_relative_eq!(frames.directions[1], blended, epsilon = 1e-12);
    }

    #[test]
    fn isolated_node_defaults_to_y() {
        let graph = graph_of(&[(0.0, 0.0, 0.0, 0.5)], &[]);
        let snapshot = graph.snapshot();
        let frames = resolve_traverse_directions(&snapshot, &layout_nodes(&snapshot));
        assert_relative_eq!(frames.directions[0], Vector3::y());
        assert_eq!(frames.ranks, vec![0]);
    }
}
