//! List nodes
//!
//! Inspection and indexing of list values. These nodes look at the
//! outermost level of their `List` input instead of broadcasting over it.

mod item;
mod length;

pub use item::ListItem;
pub use length::ListLength;
