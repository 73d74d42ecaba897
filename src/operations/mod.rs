pub mod creation;
pub mod cut;
pub mod junction;
pub mod layout;
pub mod normal;
pub mod post;
pub mod query;
pub mod stitch;
