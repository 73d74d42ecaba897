//! Skeleton-to-mesh pipeline and its configuration.

mod builder;
mod output;
pub mod params;

pub use builder::BuildSkin;
pub use output::{JunctionReport, NodeFrame, SkinOutput};
pub use params::{BaseNormalAxes, DeformMap, SkinParams};
