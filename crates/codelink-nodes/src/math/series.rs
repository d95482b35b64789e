//! Series Node
//!
//! Generates an arithmetic sequence of numbers.

use codelink_core::{
    ragged, EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor,
    NodeEvaluator, SocketKind, SocketSpec, Value,
};

use super::leaf_number;

/// Arithmetic sequence
///
/// # Inputs
/// - `Start` - first number (default 0)
/// - `Step` - difference between neighbours (default 1)
/// - `Count` - number of items, a non-negative integer (default 10)
///
/// # Outputs
/// - `Series` - list of `Count` numbers, at most `max_list_length` long
///
/// List inputs broadcast, producing one sequence per paired leaf.
#[derive(Debug, Default, Clone, Copy)]
pub struct Series;

impl Series {
    pub const CLASS: &'static str = "codelink.math.Series";
    pub const PORT_START: &'static str = "Start";
    pub const PORT_STEP: &'static str = "Step";
    pub const PORT_COUNT: &'static str = "Count";
    pub const PORT_SERIES: &'static str = "Series";
}

impl NodeDefinition for Series {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::Math, "Series")
            .describe("A sequence of evenly spaced numbers")
            .input(SocketSpec::new(Self::PORT_START, SocketKind::Scalar))
            .input(SocketSpec::new(Self::PORT_STEP, SocketKind::Scalar).with_default(1.0))
            .input(SocketSpec::new(Self::PORT_COUNT, SocketKind::Scalar).with_default(10.0))
            .output(SocketSpec::new(Self::PORT_SERIES, SocketKind::Any))
    }
}

impl NodeEvaluator for Series {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let [start, step, count] = inputs else {
            return Err(EvaluationError::failed("expected three inputs"));
        };
        ragged::zip_map(&[start, step, count], |leaves| {
            let start = leaf_number(leaves[0], Self::PORT_START)?;
            let step = leaf_number(leaves[1], Self::PORT_STEP)?;
            let count = leaf_number(leaves[2], Self::PORT_COUNT)?;
            if count < 0.0 || count.fract() != 0.0 {
                return Err(EvaluationError::invalid_input(
                    Self::PORT_COUNT,
                    "non-negative whole number",
                ));
            }
            let limit = ctx.config.max_list_length;
            if count > limit as f64 {
                return Err(EvaluationError::LimitExceeded {
                    requested: count.min(usize::MAX as f64) as usize,
                    limit,
                });
            }
            let items = (0..count as usize)
                .map(|i| Value::Number(start + step * i as f64))
                .collect();
            Ok(Value::List(items))
        })
    }
}

inventory::submit!(codelink_core::RegistrationFn(
    codelink_core::NodeRegistration::of::<Series>
));
