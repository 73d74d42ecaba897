use super::node::NodeId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the skeleton graph.
    pub struct EdgeId;
}

/// An undirected bone connecting two skeleton nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
    /// First endpoint.
    pub first: NodeId,
    /// Second endpoint.
    pub second: NodeId,
}

impl EdgeData {
    /// Returns the endpoint opposite to `node`.
    ///
    /// If `node` is not an endpoint, the first endpoint is returned.
    #[must_use]
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.first == node {
            self.second
        } else {
            self.first
        }
    }

    /// Returns `true` if `node` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, node: NodeId) -> bool {
        self.first == node || self.second == node
    }
}
