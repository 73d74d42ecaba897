//! Base normal resolution.
//!
//! Every node gets a unit "up" reference used together with a cut normal
//! to lay out its rings. Nodes whose neighbor rays span a plane derive
//! one directly; the rest inherit along chains, search their neighborhood
//! or fall back to an axis-derived normal. Two average/unify passes then
//! remove local twist and sign flips between consecutive nodes.

use tracing::debug;

use crate::graph::GraphSnapshot;
use crate::math::frame::{axis_derived_normal, plane_normal, try_unit};
use crate::math::{Point3, Vector3, PARALLEL_COSINE};
use crate::skin::params::BaseNormalAxes;

use super::layout::TraverseFrames;

/// Resolves one base normal per node.
pub struct ResolveBaseNormals<'a> {
    traverse: &'a TraverseFrames,
    order: &'a [usize],
    axes: BaseNormalAxes,
    average: bool,
}

impl<'a> ResolveBaseNormals<'a> {
    /// Creates a new `ResolveBaseNormals` operation over a node layout.
    #[must_use]
    pub fn new(traverse: &'a TraverseFrames, order: &'a [usize]) -> Self {
        Self {
            traverse,
            order,
            axes: BaseNormalAxes::default(),
            average: false,
        }
    }

    /// Restricts the axes used when deriving normals.
    #[must_use]
    pub fn with_axes(mut self, axes: BaseNormalAxes) -> Self {
        self.axes = axes;
        self
    }

    /// Replaces all derived normals with their weighted average.
    #[must_use]
    pub fn with_average(mut self, average: bool) -> Self {
        self.average = average;
        self
    }

    /// Executes the resolution, returning a unit normal per node.
    #[must_use]
    pub fn execute(&self, graph: &GraphSnapshot) -> Vec<Vector3> {
        let count = graph.node_count();
        let mut initial: Vec<Option<Vector3>> = (0..count)
            .map(|node| {
                initial_base_normal(graph, node, self.axes)
                    .map(|n| revise_base_normal(&n, &self.traverse.directions[node]))
            })
            .collect();
        if self.average {
            if let Some(average) = average_normals(graph, &initial) {
                for normal in initial.iter_mut().flatten() {
                    *normal = average;
                }
            }
        }
        debug!(
            derived = initial.iter().filter(|n| n.is_some()).count(),
            nodes = count,
            "derived initial base normals"
        );

        let mut resolved: Vec<Option<Vector3>> = vec![None; count];
        for &node in self.order {
            if resolved[node].is_some() {
                continue;
            }
            let normal = initial[node]
                .or_else(|| search_neighborhood(graph, node, &resolved, &initial))
                .unwrap_or_else(|| axis_derived_normal(&self.traverse.directions[node]));
            propagate(graph, node, normal, &initial, &mut resolved);
        }
        let mut normals: Vec<Vector3> = resolved
            .iter()
            .enumerate()
            .map(|(node, n)| n.unwrap_or_else(|| axis_derived_normal(&self.traverse.directions[node])))
            .collect();

        let rank_order = self.traverse.rank_order();
        for _ in 0..2 {
            normals = local_average(graph, &normals);
            unify(&rank_order, &mut normals);
        }
        normals
    }
}

/// Derives a base normal from the rays toward a node's neighbors.
///
/// Two rays give their cross product when they are neither parallel nor
/// opposite. Three or more rays use the plane through the three heaviest
/// neighbors (by radius), then pairwise crosses as a fallback.
#[must_use]
pub fn initial_base_normal(graph: &GraphSnapshot, node: usize, axes: BaseNormalAxes) -> Option<Vector3> {
    let center = graph.position(node);
    let mut rays: Vec<(Vector3, Vector3, f64)> = graph
        .neighbors(node)
        .map(|neighbor| {
            let offset = axes.mask(&(graph.position(neighbor) - center));
            let direction = try_unit(&offset).unwrap_or_else(Vector3::zeros);
            (offset, direction, graph.radius(neighbor))
        })
        .collect();

    match rays.len() {
        0 | 1 => None,
        2 => cross_if_spread(&rays[0].1, &rays[1].1),
        _ => {
            rays.sort_by(|a, b| b.2.total_cmp(&a.2));
            let [a, b, c] = [&rays[0], &rays[1], &rays[2]];
            plane_normal(
                &Point3::from(a.0),
                &Point3::from(b.0),
                &Point3::from(c.0),
            )
            .or_else(|| cross_if_spread(&a.1, &b.1))
            .or_else(|| cross_if_spread(&b.1, &c.1))
            .or_else(|| cross_if_spread(&c.1, &a.1))
        }
    }
}

fn cross_if_spread(a: &Vector3, b: &Vector3) -> Option<Vector3> {
    if a.dot(b).abs() < PARALLEL_COSINE {
        try_unit(&a.cross(b))
    } else {
        None
    }
}

/// Orients a base normal to agree with `cut_normal` and replaces it with a
/// world axis when the two are nearly parallel.
#[must_use]
pub fn revise_base_normal(base_normal: &Vector3, cut_normal: &Vector3) -> Vector3 {
    let oriented = if cut_normal.dot(base_normal) > 0.0 {
        *base_normal
    } else {
        -base_normal
    };
    if cut_normal.dot(&oriented) > PARALLEL_COSINE {
        if cut_normal.dot(&Vector3::x()).abs() > PARALLEL_COSINE {
            return Vector3::y();
        }
        return Vector3::x();
    }
    try_unit(&oriented).unwrap_or_else(|| axis_derived_normal(cut_normal))
}

/// Radius-weighted average of the derived normals, each sign-aligned with
/// the first one.
fn average_normals(graph: &GraphSnapshot, initial: &[Option<Vector3>]) -> Option<Vector3> {
    let reference = initial.iter().flatten().next()?;
    let sum = initial
        .iter()
        .enumerate()
        .filter_map(|(node, n)| n.map(|n| (node, n)))
        .fold(Vector3::zeros(), |sum, (node, n)| {
            let aligned = if n.dot(reference) < 0.0 { -n } else { n };
            sum + aligned * graph.radius(node)
        });
    try_unit(&sum)
}

/// Looks for a normal around `start`: a resolved neighbor, then a neighbor
/// with a derived normal, then the same search from each neighbor in turn.
fn search_neighborhood(
    graph: &GraphSnapshot,
    start: usize,
    resolved: &[Option<Vector3>],
    initial: &[Option<Vector3>],
) -> Option<Vector3> {
    let mut searched = vec![false; graph.node_count()];
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if searched[node] {
            continue;
        }
        searched[node] = true;
        let neighbors: Vec<usize> = graph.neighbors(node).collect();
        if let Some(found) = neighbors
            .iter()
            .find_map(|&n| resolved[n])
            .or_else(|| neighbors.iter().find_map(|&n| initial[n]))
        {
            return Some(found);
        }
        stack.extend(neighbors.iter().rev().filter(|&&n| !searched[n]));
    }
    None
}

/// Assigns `normal` to `start` and carries it along chains: degree-1
/// neighbors inherit it, degree-2 neighbors keep their own derived normal
/// if they have one. Junctions stop the walk.
fn propagate(
    graph: &GraphSnapshot,
    start: usize,
    normal: Vector3,
    initial: &[Option<Vector3>],
    resolved: &mut [Option<Vector3>],
) {
    let mut stack = vec![(start, normal)];
    while let Some((node, normal)) = stack.pop() {
        if resolved[node].is_some() {
            continue;
        }
        resolved[node] = Some(normal);
        let neighbors: Vec<usize> = graph.neighbors(node).collect();
        for &neighbor in neighbors.iter().rev() {
            if resolved[neighbor].is_some() {
                continue;
            }
            match graph.degree(neighbor) {
                1 => stack.push((neighbor, normal)),
                2 => stack.push((neighbor, initial[neighbor].unwrap_or(normal))),
                _ => {}
            }
        }
    }
}

/// Blends each normal with its sign-aligned neighbors.
fn local_average(graph: &GraphSnapshot, normals: &[Vector3]) -> Vec<Vector3> {
    normals
        .iter()
        .enumerate()
        .map(|(node, own)| {
            let sum = graph.neighbors(node).fold(*own, |sum, neighbor| {
                let n = normals[neighbor];
                sum + if n.dot(own) < 0.0 { -n } else { n }
            });
            try_unit(&sum).unwrap_or(*own)
        })
        .collect()
}

/// Flips any normal facing away from its predecessor in rank order.
fn unify(rank_order: &[usize], normals: &mut [Vector3]) {
    for pair in rank_order.windows(2) {
        let (previous, node) = (pair[0], pair[1]);
        if normals[node].dot(&normals[previous]) <= 0.0 {
            normals[node] = -normals[node];
        }
    }
}
