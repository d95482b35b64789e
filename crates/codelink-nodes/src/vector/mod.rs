//! Vector nodes
//!
//! Conversion between 3D vectors and their scalar components.

mod construct;
mod deconstruct;

pub use construct::ConstructVector;
pub use deconstruct::DeconstructVector;

/// Port names of the three components, in order
pub(crate) const COMPONENTS: [&str; 3] = ["X", "Y", "Z"];
