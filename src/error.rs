use thiserror::Error;

/// Top-level error type for the skinning core.
#[derive(Debug, Error)]
pub enum SkinError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Errors related to the skeleton graph supplied by the caller.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node radius must be positive and finite, got {radius}")]
    InvalidRadius { radius: f64 },

    #[error("invalid cut template: {0}")]
    InvalidTemplate(String),

    #[error("edge connects a node to itself")]
    SelfLoop,

    #[error("node position is not finite")]
    NonFinitePosition,
}

/// Errors raised while building the skin mesh.
///
/// Geometric failures at branch junctions are not errors; they are
/// reported through [`crate::skin::SkinOutput::succeeded`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid deform map: {0}")]
    InvalidDeformMap(String),

    #[error("weld chain starting at vertex {vertex} exceeds {hops} hops")]
    WeldChainTooLong { vertex: usize, hops: usize },
}

/// Convenience type alias for results using [`SkinError`].
pub type Result<T> = std::result::Result<T, SkinError>;
