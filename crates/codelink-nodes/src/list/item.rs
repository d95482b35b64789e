//! List Item Node
//!
//! Picks items out of a list by index. The `Index` input broadcasts, so a
//! list of indices picks a list of items.

use codelink_core::{
    ragged, EvalContext, EvaluationError, NodeCategory, NodeDefinition, NodeDescriptor,
    NodeEvaluator, SocketKind, SocketSpec, Value,
};

/// Item at an index
///
/// # Inputs
/// - `List` - the list to index; a non-list value acts as a one-item list
/// - `Index` - whole number; negative values count from the end
///
/// # Properties
/// - `Wrap` - when true, out-of-range indices wrap around instead of failing
///
/// # Outputs
/// - `Item` - the selected item(s)
#[derive(Debug, Default, Clone, Copy)]
pub struct ListItem;

impl ListItem {
    pub const CLASS: &'static str = "codelink.list.Item";
    pub const PORT_LIST: &'static str = "List";
    pub const PORT_INDEX: &'static str = "Index";
    pub const PORT_ITEM: &'static str = "Item";
    pub const PROPERTY_WRAP: &'static str = "Wrap";
}

impl NodeDefinition for ListItem {
    fn descriptor() -> NodeDescriptor {
        NodeDescriptor::new(Self::CLASS, NodeCategory::List, "List Item")
            .describe("Selects an item from a list by index")
            .input(SocketSpec::new(Self::PORT_LIST, SocketKind::Any))
            .input(SocketSpec::new(Self::PORT_INDEX, SocketKind::Scalar))
            .output(SocketSpec::new(Self::PORT_ITEM, SocketKind::Any))
            .property(Self::PROPERTY_WRAP, false)
    }
}

/// Resolve `index` against a list of `len` items
fn resolve(index: f64, len: usize, wrap: bool) -> Option<usize> {
    if len == 0 || index.fract() != 0.0 || !index.is_finite() {
        return None;
    }
    let len = len as i64;
    let index = index as i64;
    if wrap {
        return Some(index.rem_euclid(len) as usize);
    }
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

impl NodeEvaluator for ListItem {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        let [list, index] = inputs else {
            return Err(EvaluationError::failed("expected two inputs"));
        };
        let wrap = ctx.boolean(Self::PROPERTY_WRAP)?;
        let items: &[Value] = match list {
            Value::List(items) => items,
            single => std::slice::from_ref(single),
        };

        ragged::zip_map(&[index], |leaves| {
            let raw = leaves[0].as_number().ok_or_else(|| {
                EvaluationError::invalid_input(Self::PORT_INDEX, "whole number")
            })?;
            resolve(raw, items.len(), wrap)
                .map(|i| items[i].clone())
                .ok_or_else(|| {
                    EvaluationError::failed(format!(
                        "Index {} out of range for list of {} items",
                        raw,
                        items.len()
                    ))
                })
        })
    }
}

inventory::submit!(codelink_core::RegistrationFn(codelink_core::NodeRegistration::of::<ListItem>));
