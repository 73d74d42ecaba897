pub mod error;
pub mod graph;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod skin;

pub use error::{Result, SkinError};
pub use graph::{EdgeId, NodeData, NodeId, SkeletonGraph};
pub use mesh::SkinMesh;
pub use skin::{BuildSkin, SkinOutput, SkinParams};
