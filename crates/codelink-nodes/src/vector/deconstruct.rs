//! Deconstruct Vector Node

use codelink_core::{
    ragged, EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor,
    NodeEvaluator, SocketKind, SocketSpec, Value,
};

use super::COMPONENTS;

/// Splits vectors into `X`, `Y` and `Z` outputs
///
/// Each output is computed separately; a list of vectors yields a list of
/// components on every output.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeconstructVector;

impl DeconstructVector {
    pub const CLASS: &'static str = "codelink.vector.Deconstruct";
    pub const PORT_VECTOR: &'static str = "Vector";
}

impl NodeDefinition for DeconstructVector {
    fn descriptor() -> NodeDescriptor {
        let mut descriptor =
            NodeDescriptor::new(Self::CLASS, NodeCategory::Vector, "Deconstruct Vector")
                .describe("Splits a vector into its three numbers")
                .input(SocketSpec::new(Self::PORT_VECTOR, SocketKind::Vector));
        for name in COMPONENTS {
            descriptor = descriptor.output(SocketSpec::new(name, SocketKind::Scalar));
        }
        descriptor
    }
}

impl NodeEvaluator for DeconstructVector {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let vector = inputs
            .first()
            .ok_or_else(|| EvaluationError::failed("expected one input"))?;
        let axis = ctx.output;
        if axis >= COMPONENTS.len() {
            return Err(EvaluationError::failed(format!("no component at output {}", axis)));
        }
        ragged::zip_map(&[vector], |leaves| {
            let components = leaves[0].as_vector().ok_or_else(|| {
                EvaluationError::invalid_input(
                    Self::PORT_VECTOR,
                    format!("vector, got {}", leaves[0].type_name()),
                )
            })?;
            Ok(Value::Number(components[axis]))
        })
    }
}

inventory::submit!(codelink_core::RegistrationFn(
    codelink_core::NodeRegistration::of::<DeconstructVector>
));
