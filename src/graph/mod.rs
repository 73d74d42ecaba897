pub mod edge;
pub mod node;
pub mod profile;
pub mod snapshot;

pub use edge::{EdgeData, EdgeId};
pub use node::{NodeData, NodeId, NodeKind};
pub use profile::{circle_template, normalize_template, quad_template};
pub use snapshot::GraphSnapshot;

use crate::error::GraphError;
use slotmap::SlotMap;

/// Arena that owns the skeleton's nodes and edges.
///
/// Entities reference each other via typed IDs (generational indices).
/// A build reads the graph as an immutable snapshot; derived per-node
/// state lives in the builder, never here.
#[derive(Debug, Default, Clone)]
pub struct SkeletonGraph {
    nodes: SlotMap<NodeId, NodeData>,
    edges: SlotMap<EdgeId, EdgeData>,
}

impl SkeletonGraph {
    /// Creates a new, empty skeleton graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Validates and inserts a node, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the position or rotation is not finite, the
    /// radius is not positive, or the cut template has fewer than three
    /// finite points.
    pub fn add_node(&mut self, data: NodeData) -> Result<NodeId, GraphError> {
        validate_node(&data)?;
        Ok(self.nodes.insert(data))
    }

    /// Returns a reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the graph.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(format!("{id:?}")))
    }

    /// Removes a node together with every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the graph.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeData, GraphError> {
        let data = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(format!("{id:?}")))?;
        self.edges.retain(|_, edge| !edge.touches(id));
        Ok(data)
    }

    /// Iterates over all nodes in insertion order (for a graph without removals).
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Edge operations ---

    /// Connects two existing nodes and returns the new edge's ID.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing or both IDs are equal.
    pub fn add_edge(&mut self, first: NodeId, second: NodeId) -> Result<EdgeId, GraphError> {
        if first == second {
            return Err(GraphError::SelfLoop);
        }
        self.node(first)?;
        self.node(second)?;
        Ok(self.edges.insert(EdgeData { first, second }))
    }

    /// Returns a reference to the edge data, if present.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.edges.get(id)
    }

    /// Removes an edge, returning its data if it existed.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<EdgeData> {
        self.edges.remove(id)
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges incident to the given node.
    #[must_use]
    pub fn degree(&self, id: NodeId) -> usize {
        self.edges.values().filter(|e| e.touches(id)).count()
    }

    /// Neighbors of a node, in edge insertion order.
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.other(id))
            .collect()
    }
}

fn validate_node(data: &NodeData) -> Result<(), GraphError> {
    if !data.position.iter().all(|c| c.is_finite()) {
        return Err(GraphError::NonFinitePosition);
    }
    if !data.radius.is_finite() || data.radius <= 0.0 {
        return Err(GraphError::InvalidRadius {
            radius: data.radius,
        });
    }
    if !data.cut_rotation.is_finite() {
        return Err(GraphError::InvalidTemplate("cut rotation is not finite".into()));
    }
    if data.cut_template.len() < 3 {
        return Err(GraphError::InvalidTemplate(format!(
            "at least 3 points required, got {}",
            data.cut_template.len()
        )));
    }
    if !data
        .cut_template
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite())
    {
        return Err(GraphError::InvalidTemplate("template point is not finite".into()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn node(x: f64) -> NodeData {
        NodeData::new(Point3::new(x, 0.0, 0.0), 0.5, quad_template())
    }

    #[test]
    fn add_edge_tracks_degree_and_neighbors() {
        let mut graph = SkeletonGraph::new();
        let a = graph.add_node(node(0.0)).unwrap();
        let b = graph.add_node(node(1.0)).unwrap();
        let c = graph.add_node(node(2.0)).unwrap();
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();
        assert_eq!(graph.degree(b), 2);
        assert_eq!(graph.neighbors(b), vec![a, c]);
        assert_eq!(graph.degree(a), 1);
    }

    #[test]
    fn rejects_invalid_nodes() {
        let mut graph = SkeletonGraph::new();
        let bad_radius = NodeData::new(Point3::origin(), 0.0, quad_template());
        assert!(matches!(
            graph.add_node(bad_radius),
            Err(GraphError::InvalidRadius { .. })
        ));
        let bad_template = NodeData::new(Point3::origin(), 1.0, vec![]);
        assert!(matches!(
            graph.add_node(bad_template),
            Err(GraphError::InvalidTemplate(_))
        ));
        let bad_position = NodeData::new(Point3::new(f64::NAN, 0.0, 0.0), 1.0, quad_template());
        assert!(matches!(
            graph.add_node(bad_position),
            Err(GraphError::NonFinitePosition)
        ));
    }

    #[test]
    fn rejects_self_loops_and_missing_nodes() {
        let mut graph = SkeletonGraph::new();
        let a = graph.add_node(node(0.0)).unwrap();
        assert!(matches!(graph.add_edge(a, a), Err(GraphError::SelfLoop)));
        let b = graph.add_node(node(1.0)).unwrap();
        graph.remove_node(b).unwrap();
        assert!(matches!(
            graph.add_edge(a, b),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut graph = SkeletonGraph::new();
        let a = graph.add_node(node(0.0)).unwrap();
        let b = graph.add_node(node(1.0)).unwrap();
        let c = graph.add_node(node(2.0)).unwrap();
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();
        graph.remove_node(b).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 2);
    }
}
