//! Graph nodes
//!
//! A node owns its property model, its ordered sockets and, for composite
//! nodes, a nested `Scene`. Evaluation state (cache slots, version stamps)
//! lives on the node but is never persisted.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::property::{keys, PropertyModel, PropertyValue};
use crate::scene::Scene;
use crate::socket::Socket;
use crate::types::{Direction, FrameId, NodeId, NodeState, SocketRef};
use crate::value::Value;

/// Mapping from composite socket index to the sub-graph socket behind it
///
/// Keyed by socket index, so sockets the composite had before folding stay
/// unmapped while later proxies keep their own positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinMap {
    pub inputs: BTreeMap<usize, SocketRef>,
    pub outputs: BTreeMap<usize, SocketRef>,
}

impl PinMap {
    pub fn side(&self, direction: Direction) -> &BTreeMap<usize, SocketRef> {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    /// Inner socket behind composite socket `index`
    pub fn get(&self, direction: Direction, index: usize) -> Option<SocketRef> {
        self.side(direction).get(&index).copied()
    }

    pub(crate) fn insert(&mut self, index: usize, inner: SocketRef) {
        match inner.direction {
            Direction::Input => self.inputs.insert(index, inner),
            Direction::Output => self.outputs.insert(index, inner),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// Memoized output value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSlot {
    /// Last value produced, kept across failures
    pub value: Option<Value>,
    /// Whether `value` reflects the current inputs
    pub valid: bool,
}

/// Standard layout properties every node starts with
pub fn standard_properties(name: &str) -> Vec<(&'static str, PropertyValue)> {
    vec![
        (keys::NAME, PropertyValue::from(name)),
        (keys::X, PropertyValue::from(0.0)),
        (keys::Y, PropertyValue::from(0.0)),
        (keys::WIDTH, PropertyValue::from(160.0)),
        (keys::HEIGHT, PropertyValue::from(80.0)),
        (keys::COLOR, PropertyValue::from("#37474f")),
        (keys::COLLAPSED, PropertyValue::from(false)),
    ]
}

/// A node in a scene
#[derive(Debug, Clone)]
pub struct Node {
    /// Nil until the node is added to a scene
    pub id: NodeId,
    /// Registry type tag
    pub class: String,
    pub(crate) properties: PropertyModel,
    pub(crate) inputs: Vec<Socket>,
    pub(crate) outputs: Vec<Socket>,
    pub(crate) subgraph: Option<Box<Scene>>,
    pub(crate) pin_map: PinMap,
    pub(crate) frame: Option<FrameId>,

    pub(crate) state: NodeState,
    pub(crate) slots: Vec<CacheSlot>,
    pub(crate) version: u64,
    pub(crate) input_stamp: u64,
}

impl Node {
    /// A node with the standard property schema and no sockets
    pub fn new(class: impl Into<String>, name: &str) -> Self {
        Self::with_properties(class, PropertyModel::schema(standard_properties(name)))
    }

    /// A node with a caller-built property model
    pub fn with_properties(class: impl Into<String>, properties: PropertyModel) -> Self {
        Self {
            id: Uuid::nil(),
            class: class.into(),
            properties,
            inputs: Vec::new(),
            outputs: Vec::new(),
            subgraph: None,
            pin_map: PinMap::default(),
            frame: None,
            state: NodeState::Dirty,
            slots: Vec::new(),
            version: 0,
            input_stamp: 0,
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_input(mut self, socket: Socket) -> Self {
        self.push_socket(socket.with_direction(Direction::Input));
        self
    }

    pub fn with_output(mut self, socket: Socket) -> Self {
        self.push_socket(socket.with_direction(Direction::Output));
        self
    }

    /// Give the node an (empty) sub-graph
    pub fn with_subgraph(mut self, scene: Scene) -> Self {
        self.subgraph = Some(Box::new(scene));
        self
    }

    pub(crate) fn push_socket(&mut self, socket: Socket) -> usize {
        match socket.direction() {
            Direction::Input => {
                self.inputs.push(socket);
                self.inputs.len() - 1
            }
            Direction::Output => {
                self.outputs.push(socket);
                self.slots.push(CacheSlot::default());
                self.outputs.len() - 1
            }
        }
    }

    pub fn properties(&self) -> &PropertyModel {
        &self.properties
    }

    pub fn name(&self) -> &str {
        self.properties
            .get(keys::NAME)
            .and_then(PropertyValue::as_text)
            .unwrap_or(self.class.as_str())
    }

    pub fn inputs(&self) -> &[Socket] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Socket] {
        &self.outputs
    }

    pub fn sockets(&self, direction: Direction) -> &[Socket] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub(crate) fn sockets_mut(&mut self, direction: Direction) -> &mut Vec<Socket> {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    pub fn socket(&self, direction: Direction, index: usize) -> Option<&Socket> {
        self.sockets(direction).get(index)
    }

    pub(crate) fn socket_mut(&mut self, direction: Direction, index: usize) -> Option<&mut Socket> {
        self.sockets_mut(direction).get_mut(index)
    }

    /// Composite nodes own a sub-graph
    pub fn is_composite(&self) -> bool {
        self.subgraph.is_some()
    }

    pub fn subgraph(&self) -> Option<&Scene> {
        self.subgraph.as_deref()
    }

    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Last value computed for output `index`
    pub fn cached(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(|slot| slot.value.as_ref())
    }

    /// Whether output `index` holds a value for the current inputs
    pub fn is_cached(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.valid)
    }

    /// Bumped each time the node recomputes after a change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Reset evaluation state to "never evaluated"
    pub(crate) fn reset_cache(&mut self) {
        self.state = NodeState::Dirty;
        self.slots = vec![CacheSlot::default(); self.outputs.len()];
        self.version = 0;
        self.input_stamp = 0;
    }

    /// Every edge id incident to any socket
    pub(crate) fn incident_edges(&self) -> Vec<crate::types::EdgeId> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .flat_map(|s| s.edges.iter().copied())
            .collect()
    }
}
