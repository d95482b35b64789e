//! Boolean Node

use codelink_core::{
    EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor, NodeEvaluator,
    SocketKind, SocketSpec, Value,
};

/// Boolean constant, emitting its `Value` property
#[derive(Debug, Default, Clone, Copy)]
pub struct Boolean;

impl Boolean {
    pub const CLASS: &'static str = "codelink.input.Boolean";
    pub const PROPERTY_VALUE: &'static str = "Value";
    pub const PORT_VALUE: &'static str = "Value";
}

impl NodeDefinition for Boolean {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::Input, "Boolean")
            .describe("A constant true/false value")
            .output(SocketSpec::new(Self::PORT_VALUE, SocketKind::Boolean))
            .property(Self::PROPERTY_VALUE, false)
    }
}

impl NodeEvaluator for Boolean {
    fn evaluate(&self, ctx: &EvalContext<'_>, _inputs: &[Value]) -> Result<Value, EvaluationError> {
        Ok(Value::Bool(ctx.boolean(Self::PROPERTY_VALUE)?))
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<Boolean>));
