//! Input nodes
//!
//! Constant parameters edited through node properties.

mod boolean;
mod number;

pub use boolean::Boolean;
pub use number::Number;
