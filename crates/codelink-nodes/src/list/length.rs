//! List Length Node

use codelink_core::{
    EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor, NodeEvaluator,
    SocketKind, SocketSpec, Value,
};

/// Number of items at the outermost level of a list
///
/// Null counts as empty; any other non-list value counts as one item.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListLength;

impl ListLength {
    pub const CLASS: &'static str = "codelink.list.Length";
    pub const PORT_LIST: &'static str = "List";
    pub const PORT_LENGTH: &'static str = "Length";
}

impl NodeDefinition for ListLength {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::List, "List Length")
            .describe("Counts the items in a list")
            .input(SocketSpec::new(Self::PORT_LIST, SocketKind::Any))
            .output(SocketSpec::new(Self::PORT_LENGTH, SocketKind::Scalar))
    }
}

impl NodeEvaluator for ListLength {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let length = match inputs.first() {
            None | Some(Value::Null) => 0,
            Some(Value::List(items)) => items.len(),
            Some(_) => 1,
        };
        Ok(Value::Number(length as f64))
    }
}

inventory::submit!(codelink_core::RegistrationFn(
    codelink_core::NodeRegistration::of::<ListLength>
));
