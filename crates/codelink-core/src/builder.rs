//! Fluent builder for scenes
//!
//! Nodes are addressed by caller-chosen labels and sockets by name, so
//! tests and scripts can describe a graph without juggling UUIDs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CodeLinkError, Result};
use crate::events::EventSink;
use crate::property::PropertyValue;
use crate::registry::NodeRegistry;
use crate::scene::Scene;
use crate::types::{Direction, Frame, NodeId, SocketRef};
use crate::value::Value;

enum Step {
    Node { label: String, class: String },
    Property { key: String, value: PropertyValue },
    Default { input: String, value: Value },
    Edge {
        source: String,
        source_port: String,
        target: String,
        target_port: String,
    },
    Frame { name: String, members: Vec<String> },
}

/// Fluent builder for constructing scenes
///
/// # Example
///
/// ```ignore
/// let built = SceneBuilder::new(&registry)
///     .add_node("a", "codelink.input.Number")
///     .with_property("Value", 5.0)
///     .add_node("sum", "codelink.math.Add")
///     .with_default("B", 3.0)
///     .connect("a", "Value", "sum", "A")
///     .build()?;
/// let sum = built.output("sum", "Result")?;
/// ```
pub struct SceneBuilder<'r> {
    registry: &'r NodeRegistry,
    steps: Vec<Step>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<'r> SceneBuilder<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            steps: Vec::new(),
            sink: None,
        }
    }

    /// Route the built scene's events to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Add a node of `class` under `label`
    pub fn add_node(mut self, label: impl Into<String>, class: impl Into<String>) -> Self {
        self.steps.push(Step::Node {
            label: label.into(),
            class: class.into(),
        });
        self
    }

    /// Set a property on the most recently added node
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.steps.push(Step::Property {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Set an input default on the most recently added node
    pub fn with_default(mut self, input: impl Into<String>, value: impl Into<Value>) -> Self {
        self.steps.push(Step::Default {
            input: input.into(),
            value: value.into(),
        });
        self
    }

    /// Connect an output of `source` to an input of `target`, by socket name
    pub fn connect(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.steps.push(Step::Edge {
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        });
        self
    }

    /// Group labelled nodes in a frame
    pub fn frame(mut self, name: impl Into<String>, members: &[&str]) -> Self {
        self.steps.push(Step::Frame {
            name: name.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        });
        self
    }

    /// Build the scene, stopping at the first step that fails
    pub fn build(self) -> Result<BuiltScene> {
        let mut built = BuiltScene {
            scene: Scene::new(),
            ids: HashMap::new(),
        };
        if let Some(sink) = self.sink {
            built.scene.set_sink(sink);
        }

        let mut last: Option<NodeId> = None;
        for step in self.steps {
            match step {
                Step::Node { label, class } => {
                    if built.ids.contains_key(&label) {
                        return Err(CodeLinkError::invalid(format!(
                            "label '{}' is used twice",
                            label
                        )));
                    }
                    let id = built.scene.add_node(self.registry.create(&class)?)?;
                    built.ids.insert(label, id);
                    last = Some(id);
                }
                Step::Property { key, value } => {
                    let id = last.ok_or_else(|| no_node("with_property"))?;
                    built.scene.set_property(id, &key, value)?;
                }
                Step::Default { input, value } => {
                    let id = last.ok_or_else(|| no_node("with_default"))?;
                    let socket = built.socket(id, Direction::Input, &input)?;
                    built.scene.set_socket_default(socket, value)?;
                }
                Step::Edge {
                    source,
                    source_port,
                    target,
                    target_port,
                } => {
                    let start = built.output(&source, &source_port)?;
                    let end = built.input(&target, &target_port)?;
                    built.scene.connect(start, end)?;
                }
                Step::Frame { name, members } => {
                    let mut frame = Frame::new(name);
                    for member in &members {
                        frame.members.insert(built.id(member)?);
                    }
                    built.scene.add_frame(frame)?;
                }
            }
        }
        Ok(built)
    }
}

fn no_node(step: &str) -> CodeLinkError {
    CodeLinkError::invalid(format!("{} called before any node was added", step))
}

/// A built scene with its label table
#[derive(Debug)]
pub struct BuiltScene {
    pub scene: Scene,
    pub ids: HashMap<String, NodeId>,
}

impl BuiltScene {
    /// Node id for `label`
    pub fn id(&self, label: &str) -> Result<NodeId> {
        self.ids
            .get(label)
            .copied()
            .ok_or_else(|| CodeLinkError::invalid(format!("no node labelled '{}'", label)))
    }

    /// Input socket `name` of the node labelled `label`
    pub fn input(&self, label: &str, name: &str) -> Result<SocketRef> {
        self.socket(self.id(label)?, Direction::Input, name)
    }

    /// Output socket `name` of the node labelled `label`
    pub fn output(&self, label: &str, name: &str) -> Result<SocketRef> {
        self.socket(self.id(label)?, Direction::Output, name)
    }

    fn socket(&self, node: NodeId, direction: Direction, name: &str) -> Result<SocketRef> {
        let index = self
            .scene
            .node(node)
            .and_then(|n| n.sockets(direction).iter().position(|s| s.name == name))
            .ok_or_else(|| {
                CodeLinkError::invalid(format!(
                    "node {} has no {:?} named '{}'",
                    node, direction, name
                ))
            })?;
        Ok(SocketRef {
            node,
            direction,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeDescriptor, SocketSpec};
    use crate::types::{NodeCategory, SocketKind};

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_descriptor(
            NodeDescriptor::new("test.Number", NodeCategory::Input, "Number")
                .output(SocketSpec::new("Value", SocketKind::Scalar))
                .property("Value", 0.0),
        );
        registry.register_descriptor(
            NodeDescriptor::new("test.Add", NodeCategory::Math, "Add")
                .input(SocketSpec::new("A", SocketKind::Scalar))
                .input(SocketSpec::new("B", SocketKind::Scalar))
                .output(SocketSpec::new("Result", SocketKind::Scalar)),
        );
        registry
    }

    #[test]
    fn test_builder_basic() {
        let registry = registry();
        let built = SceneBuilder::new(&registry)
            .add_node("a", "test.Number")
            .with_property("Value", 5.0)
            .add_node("sum", "test.Add")
            .with_default("B", 3.0)
            .connect("a", "Value", "sum", "A")
            .frame("Inputs", &["a"])
            .build()
            .unwrap();

        assert_eq!(built.scene.node_count(), 2);
        assert_eq!(built.scene.edge_count(), 1);
        assert_eq!(built.scene.frame_count(), 1);

        let a = built.id("a").unwrap();
        let sum = built.id("sum").unwrap();
        assert_eq!(
            built.scene.node(a).unwrap().properties().get("Value"),
            Some(&PropertyValue::Number(5.0))
        );
        assert_eq!(
            built.scene.node(sum).unwrap().inputs()[1].default,
            Value::Number(3.0)
        );
        assert_eq!(built.output("sum", "Result").unwrap(), SocketRef::output(sum, 0));
        assert_eq!(built.scene.predecessors(sum), vec![a]);
    }

    #[test]
    fn test_builder_errors() {
        let registry = registry();

        let err = SceneBuilder::new(&registry)
            .with_property("Value", 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CodeLinkError::InvalidOperation(_)));

        let err = SceneBuilder::new(&registry)
            .add_node("x", "test.Missing")
            .build()
            .unwrap_err();
        assert!(matches!(err, CodeLinkError::UnknownClass(_)));

        let err = SceneBuilder::new(&registry)
            .add_node("a", "test.Number")
            .add_node("b", "test.Add")
            .connect("a", "Nope", "b", "A")
            .build()
            .unwrap_err();
        assert!(matches!(err, CodeLinkError::InvalidOperation(_)));

        let err = SceneBuilder::new(&registry)
            .add_node("a", "test.Number")
            .add_node("a", "test.Number")
            .build()
            .unwrap_err();
        assert!(matches!(err, CodeLinkError::InvalidOperation(_)));
    }
}
