use crate::graph::{NodeId, NodeKind};
use crate::math::Vector3;
use crate::mesh::SkinMesh;
use crate::operations::cut::CutTransform;

/// Everything a build produces.
#[derive(Debug, Clone)]
pub struct SkinOutput {
    /// The generated skin. Usable even when `succeeded` is `false`.
    pub mesh: SkinMesh,
    /// `false` if any junction or tube segment could not be closed.
    pub succeeded: bool,
    /// One report per branch junction, in processing order.
    pub junctions: Vec<JunctionReport>,
    /// Resolved frame of every node, in graph iteration order.
    pub frames: Vec<NodeFrame>,
}

impl SkinOutput {
    /// Output of a skeleton without nodes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mesh: SkinMesh::default(),
            succeeded: true,
            junctions: Vec::new(),
            frames: Vec::new(),
        }
    }
}

/// How a branch junction was wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionReport {
    /// The junction node.
    pub node: NodeId,
    /// Wrap attempts made, including the final one.
    pub attempts: usize,
    /// Pass-through neighbors spliced out to make the wrap work.
    pub swallowed: Vec<NodeId>,
    /// Whether the junction was closed.
    pub succeeded: bool,
}

/// Per-node orientation derived during a build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeFrame {
    pub node: NodeId,
    pub kind: NodeKind,
    /// Unit travel direction.
    pub traverse_direction: Vector3,
    /// Unit "up" reference; for ring nodes, the one the ring was built with.
    pub base_normal: Vector3,
    /// Depth-first visit index.
    pub traverse_rank: usize,
    /// Ring transform of endpoint and pass-through nodes.
    pub cut_transform: Option<CutTransform>,
}
