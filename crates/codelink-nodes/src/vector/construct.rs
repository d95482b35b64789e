//! Construct Vector Node

use codelink_core::{
    ragged, EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor,
    NodeEvaluator, SocketKind, SocketSpec, Value,
};

use super::COMPONENTS;
use crate::math::leaf_number;

/// Builds vectors from `X`, `Y` and `Z` components
///
/// Component lists broadcast, yielding a list of vectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructVector;

impl ConstructVector {
    pub const CLASS: &'static str = "codelink.vector.Construct";
    pub const PORT_VECTOR: &'static str = "Vector";
}

impl NodeDefinition for ConstructVector {
    fn descriptor() -> NodeDescriptor {
        let mut descriptor =
            NodeDescriptor::new(Self::CLASS, NodeCategory::Vector, "Construct Vector")
                .describe("Combines three numbers into a vector");
        for name in COMPONENTS {
            descriptor = descriptor.input(SocketSpec::new(name, SocketKind::Scalar));
        }
        descriptor.output(SocketSpec::new(Self::PORT_VECTOR, SocketKind::Vector))
    }
}

impl NodeEvaluator for ConstructVector {
    fn evaluate(&self, _ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let [x, y, z] = inputs else {
            return Err(EvaluationError::failed("expected three inputs"));
        };
        ragged::zip_map(&[x, y, z], |leaves| {
            let mut vector = [0.0; 3];
            for (slot, (leaf, name)) in vector.iter_mut().zip(leaves.iter().zip(COMPONENTS)) {
                *slot = leaf_number(leaf, name)?;
            }
            Ok(Value::Vector(vector))
        })
    }
}

inventory::submit!(codelink_core::RegistrationFn(
    codelink_core::NodeRegistration::of::<ConstructVector>
));
