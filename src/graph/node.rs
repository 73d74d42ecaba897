use crate::math::{Point2, Point3};

slotmap::new_key_type! {
    /// Unique identifier for a node in the skeleton graph.
    pub struct NodeId;
}

/// A skeleton node: a sphere with a cross-section profile.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Center of the node.
    pub position: Point3,
    /// Radius of the node's cross-section. Must be positive.
    pub radius: f64,
    /// Unit cross-section profile. Point order defines the ring winding
    /// and should be counter-clockwise.
    pub cut_template: Vec<Point2>,
    /// Extra rotation of the profile around the cut normal, in `[-1, 1]`
    /// (multiplied by 180 degrees).
    pub cut_rotation: f64,
}

impl NodeData {
    /// Creates a new node without profile rotation.
    #[must_use]
    pub fn new(position: Point3, radius: f64, cut_template: Vec<Point2>) -> Self {
        Self {
            position,
            radius,
            cut_template,
            cut_rotation: 0.0,
        }
    }

    /// Sets the profile rotation.
    #[must_use]
    pub fn with_cut_rotation(mut self, cut_rotation: f64) -> Self {
        self.cut_rotation = cut_rotation;
        self
    }
}

/// Role of a node in the skin, chosen once per build from its degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No edges: skinned as a standalone box.
    Isolated,
    /// One edge: one ring plus an end cap.
    Endpoint,
    /// Two edges: one ring shared by both tube segments.
    PassThrough,
    /// Three or more edges: trimmed rings joined by a wrapped cap.
    Junction,
}

impl NodeKind {
    /// Classifies a node by its number of incident edges.
    #[must_use]
    pub fn from_degree(degree: usize) -> Self {
        match degree {
            0 => Self::Isolated,
            1 => Self::Endpoint,
            2 => Self::PassThrough,
            _ => Self::Junction,
        }
    }
}
