//! Dense, build-local copy of a skeleton graph.
//!
//! Nodes and edges are addressed by `usize` indices into plain vectors so
//! the builder can keep parallel per-node state next to them. Splicing out
//! a swallowed node only touches this copy, never the caller's graph.

use slotmap::SecondaryMap;

use super::{NodeData, NodeId, NodeKind, SkeletonGraph};
use crate::math::Point3;

/// Arena view of a [`SkeletonGraph`] with dense indices.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    /// Caller-facing ID of each dense node index.
    pub ids: Vec<NodeId>,
    /// Node records, cloned from the graph.
    pub nodes: Vec<NodeData>,
    /// Endpoints of each edge.
    pub edges: Vec<[usize; 2]>,
    /// Incident edge indices of each node, in edge insertion order.
    pub incident: Vec<Vec<usize>>,
    degrees: Vec<usize>,
}

impl GraphSnapshot {
    /// Copies `graph` into dense arrays.
    #[must_use]
    pub fn new(graph: &SkeletonGraph) -> Self {
        let mut dense: SecondaryMap<NodeId, usize> = SecondaryMap::new();
        let mut ids = Vec::with_capacity(graph.node_count());
        let mut nodes = Vec::with_capacity(graph.node_count());
        for (id, data) in graph.nodes() {
            dense.insert(id, ids.len());
            ids.push(id);
            nodes.push(data.clone());
        }

        let mut edges = Vec::with_capacity(graph.edge_count());
        let mut incident = vec![Vec::new(); ids.len()];
        for (_, edge) in graph.edges() {
            let (Some(&a), Some(&b)) = (dense.get(edge.first), dense.get(edge.second)) else {
                continue;
            };
            incident[a].push(edges.len());
            incident[b].push(edges.len());
            edges.push([a, b]);
        }
        let degrees = incident.iter().map(Vec::len).collect();

        Self {
            ids,
            nodes,
            edges,
            incident,
            degrees,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Degree of a node in the original graph.
    ///
    /// Swallowing a neighbor replaces an incident edge instead of removing
    /// it, so the degree never changes during a build.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.degrees[node]
    }

    /// Role of a node, derived from its degree.
    #[must_use]
    pub fn kind(&self, node: usize) -> NodeKind {
        NodeKind::from_degree(self.degree(node))
    }

    /// Center of a node.
    #[must_use]
    pub fn position(&self, node: usize) -> &Point3 {
        &self.nodes[node].position
    }

    /// Radius of a node.
    #[must_use]
    pub fn radius(&self, node: usize) -> f64 {
        self.nodes[node].radius
    }

    /// Endpoint of `edge` opposite to `node`.
    #[must_use]
    pub fn other_end(&self, edge: usize, node: usize) -> usize {
        let [a, b] = self.edges[edge];
        if a == node {
            b
        } else {
            a
        }
    }

    /// Current neighbors of a node, one per incident edge.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.incident[node]
            .iter()
            .map(move |&edge| self.other_end(edge, node))
    }

    /// Reattaches the `from` end of `edge` to `to`.
    pub fn redirect_edge(&mut self, edge: usize, from: usize, to: usize) {
        for end in &mut self.edges[edge] {
            if *end == from {
                *end = to;
            }
        }
    }
}

impl SkeletonGraph {
    /// Takes a dense snapshot of the graph for one build.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self)
    }
}
