//! Math nodes
//!
//! Elementwise arithmetic over scalars and nested lists of scalars, plus
//! numeric sequence generation.

mod arithmetic;
mod series;

pub use arithmetic::{Add, Divide, Multiply, Subtract};
pub use series::Series;

use codelink_core::{ragged, EvaluationError, Value};

/// Read a leaf as a number, naming `socket` on failure
pub(crate) fn leaf_number(value: &Value, socket: &str) -> Result<f64, EvaluationError> {
    value.as_number().ok_or_else(|| {
        EvaluationError::invalid_input(socket, format!("number, got {}", value.type_name()))
    })
}

/// Broadcast `a` and `b` and combine each pair of leaves with `op`
pub(crate) fn binary<F>(a: &Value, b: &Value, op: F) -> Result<Value, EvaluationError>
where
    F: Fn(f64, f64) -> Result<f64, EvaluationError>,
{
    ragged::zip_map(&[a, b], |leaves| {
        let x = leaf_number(leaves[0], "A")?;
        let y = leaf_number(leaves[1], "B")?;
        op(x, y).map(Value::Number)
    })
}
