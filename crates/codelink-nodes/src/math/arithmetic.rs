//! Binary arithmetic nodes
//!
//! All four share the same layout: inputs `A` and `B`, output `Result`.
//! Lists broadcast against each other and against plain numbers.

use codelink_core::{
    EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor, NodeEvaluator,
    SocketKind, SocketSpec, Value,
};

use super::binary;

/// Port name for the left operand
pub const PORT_A: &str = "A";
/// Port name for the right operand
pub const PORT_B: &str = "B";
/// Port name for the result
pub const PORT_RESULT: &str = "Result";

fn arithmetic_descriptor(
    class: &str,
    label: &str,
    description: &str,
    b_default: f64,
) -> NodeDescriptor {
    NodeDescriptor::new(class, NodeCategory::Math, label)
        .describe(description)
        .input(SocketSpec::new(PORT_A, SocketKind::Scalar))
        .input(SocketSpec::new(PORT_B, SocketKind::Scalar).with_default(b_default))
        .output(SocketSpec::new(PORT_RESULT, SocketKind::Scalar))
}

fn operands(inputs: &[Value]) -> Result<(&Value, &Value), EvaluationError> {
    match inputs {
        [a, b, ..] => Ok((a, b)),
        _ => Err(EvaluationError::failed("expected two inputs")),
    }
}

/// A + B
#[derive(Debug, Default, Clone, Copy)]
pub struct Add;

impl Add {
    pub const CLASS: &'static str = "codelink.math.Add";
}

impl NodeDefinition for Add {
    fn descriptor() -> NodeDescriptor {
        arithmetic_descriptor(Self::CLASS, "Add", "Adds B to A", 0.0)
    }
}

impl NodeEvaluator for Add {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let (a, b) = operands(inputs)?;
        binary(a, b, |x, y| Ok(x + y))
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Add>));

/// A - B
#[derive(Debug, Default, Clone, Copy)]
pub struct Subtract;

impl Subtract {
    pub const CLASS: &'static str = "codelink.math.Subtract";
}

impl NodeDefinition for Subtract {
    fn descriptor() -> NodeDescriptor {
        arithmetic_descriptor(Self::CLASS, "Subtract", "Subtracts B from A", 0.0)
    }
}

impl NodeEvaluator for Subtract {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let (a, b) = operands(inputs)?;
        binary(a, b, |x, y| Ok(x - y))
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Subtract>));

/// A * B
#[derive(Debug, Default, Clone, Copy)]
pub struct Multiply;

impl Multiply {
    pub const CLASS: &'static str = "codelink.math.Multiply";
}

impl NodeDefinition for Multiply {
    fn descriptor() -> NodeDescriptor {
        arithmetic_descriptor(Self::CLASS, "Multiply", "Multiplies A by B", 1.0)
    }
}

impl NodeEvaluator for Multiply {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let (a, b) = operands(inputs)?;
        binary(a, b, |x, y| Ok(x * y))
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Multiply>));

/// A / B
///
/// Division by zero fails the node instead of producing an infinity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Divide;

impl Divide {
    pub const CLASS: &'static str = "codelink.math.Divide";
}

impl NodeDefinition for Divide {
    fn descriptor() -> NodeDescriptor {
        arithmetic_descriptor(Self::CLASS, "Divide", "Divides A by B", 1.0)
    }
}

impl NodeEvaluator for Divide {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let (a, b) = operands(inputs)?;
        binary(a, b, |x, y| {
            if y == 0.0 {
                Err(EvaluationError::failed("Division by zero"))
            } else {
                Ok(x / y)
            }
        })
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Divide>));
