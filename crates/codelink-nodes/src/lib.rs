//! CodeLink Nodes
//!
//! Built-in node classes for the CodeLink dataflow engine. Every class
//! registers itself at link time, so `NodeRegistry::with_builtins()` picks
//! them all up once this crate is linked.
//!
//! # Categories
//!
//! - **Input**: constant parameters (`Number`, `Boolean`)
//! - **Math**: elementwise arithmetic and numeric sequences
//! - **List**: list length and indexing
//! - **Vector**: building vectors from components and back
//! - **Sampling**: seeded point distribution inside a box
//!
//! Math and vector nodes broadcast over nested list inputs, so a single
//! node evaluates once per paired leaf.

pub mod input;
pub mod list;
pub mod math;
pub mod sampling;
pub mod vector;

// Re-export all node classes for convenience
pub use input::*;
pub use list::*;
pub use math::*;
pub use sampling::*;
pub use vector::*;

use codelink_core::NodeRegistry;

/// A registry holding the composite class plus every built-in class
pub fn registry() -> NodeRegistry {
    NodeRegistry::with_builtins()
}

/// Register the built-in classes into an existing registry
///
/// Useful when `registry` was assembled by hand and should also know the
/// standard library.
pub fn register_builtins(registry: &mut NodeRegistry) {
    registry.register_node::<Number>();
    registry.register_node::<Boolean>();
    registry.register_node::<Add>();
    registry.register_node::<Subtract>();
    registry.register_node::<Multiply>();
    registry.register_node::<Divide>();
    registry.register_node::<Series>();
    registry.register_node::<ListLength>();
    registry.register_node::<ListItem>();
    registry.register_node::<ConstructVector>();
    registry.register_node::<DeconstructVector>();
    registry.register_node::<PopulateBox>();
}
