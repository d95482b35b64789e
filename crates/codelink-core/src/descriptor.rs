//! Node descriptors and evaluation functions
//!
//! A `NodeDescriptor` is the single source of truth for a node class: its
//! sockets, its extra properties and how it appears in menus. The matching
//! `NodeEvaluator` computes one output at a time from the node's current
//! input values.
//!
//! # Example
//!
//! ```ignore
//! use codelink_core::{NodeDefinition, NodeDescriptor, NodeEvaluator, SocketSpec};
//!
//! #[derive(Default)]
//! struct Negate;
//!
//! impl NodeDefinition for Negate {
//!     fn descriptor() -> NodeDescriptor {
//!         NodeDescriptor::new("example.Negate", NodeCategory::Math, "Negate")
//!             .input(SocketSpec::new("X", SocketKind::Scalar))
//!             .output(SocketSpec::new("Result", SocketKind::Scalar))
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EvaluationError;
use crate::node::{standard_properties, Node};
use crate::property::{PropertyModel, PropertyValue};
use crate::socket::{Socket, SocketFlags};
use crate::types::{Direction, NodeCategory, NodeId, SocketKind};
use crate::value::Value;

/// Declaration of one socket on a node class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketSpec {
    pub name: String,
    pub kind: SocketKind,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub flags: SocketFlags,
}

impl SocketSpec {
    /// A socket whose default is the kind's zero value
    pub fn new(name: impl Into<String>, kind: SocketKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: kind.zero(),
            flags: SocketFlags::none(),
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_flags(mut self, flags: SocketFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn to_socket(&self, direction: Direction) -> Socket {
        Socket::new(self.name.clone(), direction, self.kind)
            .with_default(self.default.clone())
            .with_flags(self.flags)
    }
}

/// Complete metadata for a node class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// Registry type tag (e.g., "codelink.math.Add")
    pub class: String,
    /// Category for menu grouping
    pub category: NodeCategory,
    /// Human-readable label, also the default node name
    pub label: String,
    /// What the node does
    pub description: String,
    pub inputs: Vec<SocketSpec>,
    pub outputs: Vec<SocketSpec>,
    /// Class-specific properties added to the standard schema
    pub properties: Vec<(String, PropertyValue)>,
}

impl NodeDescriptor {
    pub fn new(class: impl Into<String>, category: NodeCategory, label: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            category,
            label: label.into(),
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, spec: SocketSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    pub fn output(mut self, spec: SocketSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Build a fresh node of this class (nil id, `Dirty`)
    pub fn instantiate(&self) -> Node {
        let mut properties = PropertyModel::schema(standard_properties(&self.label));
        for (key, value) in &self.properties {
            properties.define(key.clone(), value.clone());
        }

        let mut node = Node::with_properties(self.class.clone(), properties);
        for spec in &self.inputs {
            node.push_socket(spec.to_socket(Direction::Input));
        }
        for spec in &self.outputs {
            node.push_socket(spec.to_socket(Direction::Output));
        }
        node
    }
}

/// What an evaluation function can see besides its inputs
pub struct EvalContext<'a> {
    pub node: NodeId,
    pub class: &'a str,
    pub properties: &'a PropertyModel,
    /// Output socket being computed
    pub output: usize,
    pub config: &'a EngineConfig,
}

impl EvalContext<'_> {
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Numeric property, or `InvalidInput` naming the key
    pub fn number(&self, key: &str) -> Result<f64, EvaluationError> {
        self.property(key)
            .and_then(PropertyValue::as_number)
            .ok_or_else(|| EvaluationError::invalid_input(key, "number property"))
    }

    /// Boolean property, or `InvalidInput` naming the key
    pub fn boolean(&self, key: &str) -> Result<bool, EvaluationError> {
        self.property(key)
            .and_then(PropertyValue::as_bool)
            .ok_or_else(|| EvaluationError::invalid_input(key, "boolean property"))
    }
}

/// Per-class evaluation function
///
/// Called once per requested output with the node's input values, after
/// input flags have been applied. Errors mark the node `Invalid` without
/// stopping evaluation of unrelated nodes.
pub trait NodeEvaluator: Send + Sync {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError>;
}

/// Trait for node classes that describe themselves
///
/// Implementing this alongside `NodeEvaluator` lets the class be
/// registered with [`crate::NodeRegistration::of`].
pub trait NodeDefinition: NodeEvaluator + Default + 'static {
    fn descriptor() -> NodeDescriptor
    where
        Self: Sized;
}

type Callback = dyn Fn(&EvalContext<'_>, &[Value]) -> Result<Value, EvaluationError> + Send + Sync;

/// Closure-backed evaluator
pub struct CallbackEvaluator {
    callback: Box<Callback>,
}

impl CallbackEvaluator {
    pub fn new(
        callback: impl Fn(&EvalContext<'_>, &[Value]) -> Result<Value, EvaluationError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl NodeEvaluator for CallbackEvaluator {
    fn evaluate(&self, ctx: &EvalContext<'_>, inputs: &[Value]) -> Result<Value, EvaluationError> {
        (self.callback)(ctx, inputs)
    }
}
