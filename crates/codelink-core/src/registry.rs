//! Node class registry
//!
//! Maps class strings to descriptors and evaluation functions. Node classes
//! defined in other crates register themselves at link time:
//!
//! ```ignore
//! inventory::submit!(codelink_core::RegistrationFn(NodeRegistration::of::<AddNode>));
//!
//! let registry = NodeRegistry::with_builtins();
//! let node = registry.create("codelink.math.Add")?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::descriptor::{NodeDefinition, NodeDescriptor, NodeEvaluator};
use crate::error::{CodeLinkError, Result};
use crate::node::Node;
use crate::scene::Scene;
use crate::types::NodeCategory;

/// Class tag of the built-in composite node
pub const COMPOSITE_CLASS: &str = "codelink.Composite";

/// A registration entry combining a descriptor with an optional evaluator
#[derive(Clone)]
pub struct NodeRegistration {
    pub descriptor: NodeDescriptor,
    pub evaluator: Option<Arc<dyn NodeEvaluator>>,
}

impl NodeRegistration {
    pub fn new(descriptor: NodeDescriptor, evaluator: Arc<dyn NodeEvaluator>) -> Self {
        Self {
            descriptor,
            evaluator: Some(evaluator),
        }
    }

    /// Registration for a self-describing node class
    pub fn of<T: NodeDefinition>() -> Self {
        Self::new(T::descriptor(), Arc::new(T::default()))
    }
}

impl std::fmt::Debug for NodeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistration")
            .field("class", &self.descriptor.class)
            .field("has_evaluator", &self.evaluator.is_some())
            .finish()
    }
}

/// Link-time registration of a node class
///
/// The wrapped function pointer is called once per
/// [`NodeRegistry::with_builtins`].
pub struct RegistrationFn(pub fn() -> NodeRegistration);

inventory::collect!(RegistrationFn);

fn composite_descriptor() -> NodeDescriptor {
    NodeDescriptor::new(COMPOSITE_CLASS, NodeCategory::Composite, "Group")
        .describe("Encapsulates a sub-graph behind proxy sockets")
}

/// Registry of node classes
///
/// Always knows the composite class; everything else is registered.
pub struct NodeRegistry {
    entries: HashMap<String, NodeRegistration>,
}

impl NodeRegistry {
    /// A registry holding only the composite class
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            COMPOSITE_CLASS.to_string(),
            NodeRegistration {
                descriptor: composite_descriptor(),
                evaluator: None,
            },
        );
        Self { entries }
    }

    /// A registry holding every class submitted through `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<RegistrationFn> {
            registry.add((entry.0)());
        }
        log::debug!("Registered {} node classes", registry.entries.len());
        registry
    }

    /// Register a class, replacing any entry with the same class tag
    pub fn add(&mut self, registration: NodeRegistration) {
        if registration.descriptor.class == COMPOSITE_CLASS {
            log::warn!("Ignoring registration that would shadow {}", COMPOSITE_CLASS);
            return;
        }
        self.entries
            .insert(registration.descriptor.class.clone(), registration);
    }

    pub fn register(&mut self, descriptor: NodeDescriptor, evaluator: Arc<dyn NodeEvaluator>) {
        self.add(NodeRegistration::new(descriptor, evaluator));
    }

    pub fn register_node<T: NodeDefinition>(&mut self) {
        self.add(NodeRegistration::of::<T>());
    }

    /// Register a class with no evaluator (palette listing, deserialization)
    pub fn register_descriptor(&mut self, descriptor: NodeDescriptor) {
        self.add(NodeRegistration {
            descriptor,
            evaluator: None,
        });
    }

    /// Instantiate a node of `class`
    pub fn create(&self, class: &str) -> Result<Node> {
        let entry = self
            .entries
            .get(class)
            .ok_or_else(|| CodeLinkError::UnknownClass(class.to_string()))?;
        let node = entry.descriptor.instantiate();
        Ok(if class == COMPOSITE_CLASS {
            node.with_subgraph(Scene::new())
        } else {
            node
        })
    }

    pub fn descriptor(&self, class: &str) -> Option<&NodeDescriptor> {
        self.entries.get(class).map(|e| &e.descriptor)
    }

    pub fn evaluator(&self, class: &str) -> Option<Arc<dyn NodeEvaluator>> {
        self.entries.get(class).and_then(|e| e.evaluator.clone())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.entries.contains_key(class)
    }

    /// Registered class tags, sorted
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    pub fn descriptors(&self) -> Vec<&NodeDescriptor> {
        self.entries.values().map(|e| &e.descriptor).collect()
    }

    /// Descriptors grouped by category, each group sorted by label
    pub fn by_category(&self) -> BTreeMap<NodeCategory, Vec<&NodeDescriptor>> {
        let mut grouped: BTreeMap<NodeCategory, Vec<&NodeDescriptor>> = BTreeMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.descriptor.category)
                .or_default()
                .push(&entry.descriptor);
        }
        for group in grouped.values_mut() {
            group.sort_by(|a, b| a.label.cmp(&b.label));
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` with the same class.
    pub fn merge(&mut self, other: NodeRegistry) {
        for (_, registration) in other.entries {
            if registration.descriptor.class != COMPOSITE_CLASS {
                self.add(registration);
            }
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("classes", &self.classes())
            .finish()
    }
}
