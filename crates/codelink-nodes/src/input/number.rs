//! Number Node
//!
//! Emits the number stored in its `Value` property.

use codelink_core::{
    EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor, NodeEvaluator,
    SocketKind, SocketSpec, Value,
};

/// Number constant
///
/// # Properties
/// - `Value` - the emitted number
///
/// # Outputs
/// - `Value` - the property value
#[derive(Debug, Default, Clone, Copy)]
pub struct Number;

impl Number {
    pub const CLASS: &'static str = "codelink.input.Number";
    /// Property holding the constant
    pub const PROPERTY_VALUE: &'static str = "Value";
    /// Port name for the output
    pub const PORT_VALUE: &'static str = "Value";
}

impl NodeDefinition for Number {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::Input, "Number")
            .describe("A constant number")
            .output(SocketSpec::new(Self::PORT_VALUE, SocketKind::Scalar))
            .property(Self::PROPERTY_VALUE, 0.0)
    }
}

impl NodeEvaluator for Number {
    fn evaluate(&self, ctx: &EvalContext<'_>, _inputs: &[Value]) -> Result<Value, EvaluationError> {
        Ok(Value::Number(ctx.number(Self::PROPERTY_VALUE)?))
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Number>));
