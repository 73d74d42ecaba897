//! Passes over the generated mesh after all rings are stitched.

mod deform;
mod hollow;
mod weld;

pub use deform::{deform_along, Deform};
pub use hollow::Hollow;
pub use weld::{Weld, MAX_WELD_HOPS};
