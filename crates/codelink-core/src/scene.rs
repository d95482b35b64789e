//! DAG scene: the live graph container
//!
//! A `Scene` owns nodes, edges and frames in slot-map arenas keyed by
//! stable UUIDs. Cross references (socket to edge, edge to socket, node to
//! frame) are plain identifiers looked up through the scene, never owning
//! pointers. Composite nodes own a nested `Scene`; see [`crate::subscene`]
//! for folding nodes into and out of one.
//!
//! Acyclicity is not enforced while editing. `is_cyclic` and
//! `topological_order` check it on demand, and the evaluator refuses to run
//! a cyclic dependency chain.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};
use uuid::Uuid;

use crate::error::{CodeLinkError, Result};
use crate::events::{emit, EventSink, ModelEvent, NullEventSink};
use crate::node::Node;
use crate::property::PropertyValue;
use crate::socket::{Socket, SocketFlags, SocketLink};
use crate::tree::{Tree, TreeData};
use crate::types::{Direction, Edge, EdgeId, Frame, FrameId, NodeId, NodeState, SocketRef};
use crate::value::Value;

new_key_type! {
    struct NodeKey;
    struct EdgeKey;
    struct FrameKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DagKey {
    Node(NodeKey),
    Edge(EdgeKey),
    Frame(FrameKey),
}

/// Any entity a scene can hold
#[derive(Debug, Clone, Copy)]
pub enum DagItem<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
    Frame(&'a Frame),
}

/// Graph container for nodes, edges and frames
#[derive(Clone)]
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    edges: SlotMap<EdgeKey, Edge>,
    frames: SlotMap<FrameKey, Frame>,
    index: HashMap<Uuid, DagKey>,
    global_version: u64,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("frames", &self.frames.len())
            .field("global_version", &self.global_version)
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene that discards events
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            frames: SlotMap::with_key(),
            index: HashMap::new(),
            global_version: 0,
            sink: Arc::new(NullEventSink),
        }
    }

    /// Route change notifications to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.set_sink(sink);
        self
    }

    /// Replace the event sink here and in every nested sub-graph
    pub fn set_sink(&mut self, sink: Arc<dyn EventSink>) {
        for node in self.nodes.values_mut() {
            if let Some(sub) = node.subgraph.as_mut() {
                sub.set_sink(sink.clone());
            }
        }
        self.sink = sink;
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        self.sink.clone()
    }

    pub(crate) fn emit(&self, event: ModelEvent) {
        emit(self.sink.as_ref(), event);
    }

    pub(crate) fn next_version(&mut self) -> u64 {
        self.global_version += 1;
        self.global_version
    }

    // ===== lookups =====

    fn node_key(&self, id: NodeId) -> Result<NodeKey> {
        match self.index.get(&id) {
            Some(DagKey::Node(key)) => Ok(*key),
            _ => Err(CodeLinkError::NodeNotFound(id)),
        }
    }

    fn frame_key(&self, id: FrameId) -> Result<FrameKey> {
        match self.index.get(&id) {
            Some(DagKey::Frame(key)) => Ok(*key),
            _ => Err(CodeLinkError::FrameNotFound(id)),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_key(id).ok().and_then(|key| self.nodes.get(key))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let key = self.node_key(id).ok()?;
        self.nodes.get_mut(key)
    }

    pub(crate) fn node_checked(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(CodeLinkError::NodeNotFound(id))
    }

    pub(crate) fn node_checked_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id).ok_or(CodeLinkError::NodeNotFound(id))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        match self.index.get(&id) {
            Some(DagKey::Edge(key)) => self.edges.get(*key),
            _ => None,
        }
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frame_key(id).ok().and_then(|key| self.frames.get(key))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.values().map(|n| n.id).collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.frames.is_empty()
    }

    pub fn socket(&self, socket: SocketRef) -> Option<&Socket> {
        self.node(socket.node)?.socket(socket.direction, socket.index)
    }

    pub(crate) fn socket_checked(&self, socket: SocketRef) -> Result<&Socket> {
        self.node_checked(socket.node)?
            .socket(socket.direction, socket.index)
            .ok_or(CodeLinkError::SocketNotFound {
                node: socket.node,
                direction: socket.direction,
                index: socket.index,
            })
    }

    pub(crate) fn socket_mut(&mut self, socket: SocketRef) -> Result<&mut Socket> {
        self.node_checked_mut(socket.node)?
            .socket_mut(socket.direction, socket.index)
            .ok_or(CodeLinkError::SocketNotFound {
                node: socket.node,
                direction: socket.direction,
                index: socket.index,
            })
    }

    /// Look up any entity by identifier
    pub fn dag_item(&self, id: Uuid) -> Option<DagItem<'_>> {
        match self.index.get(&id)? {
            DagKey::Node(key) => self.nodes.get(*key).map(DagItem::Node),
            DagKey::Edge(key) => self.edges.get(*key).map(DagItem::Edge),
            DagKey::Frame(key) => self.frames.get(*key).map(DagItem::Frame),
        }
    }

    // ===== nodes =====

    /// Add a node, assigning a fresh id when its id is nil
    ///
    /// Socket edge lists and frame membership are reset; the node starts
    /// `Dirty`.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId> {
        if node.id.is_nil() {
            node.id = Uuid::new_v4();
        }
        let id = node.id;
        if self.index.contains_key(&id) {
            return Err(CodeLinkError::DuplicateId(id));
        }

        for socket in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
            socket.edges.clear();
        }
        node.frame = None;
        node.state = NodeState::Dirty;
        if let Some(sub) = node.subgraph.as_mut() {
            sub.set_sink(self.sink.clone());
        }

        let class = node.class.clone();
        let key = self.nodes.insert(node);
        self.index.insert(id, DagKey::Node(key));

        log::debug!("Added node {} ({})", id, class);
        self.emit(ModelEvent::NodeAdded { node: id, class });
        Ok(id)
    }

    /// Remove a node with all incident edges and its frame membership
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let key = self.node_key(id)?;
        let incident = self.nodes.get(key).map(Node::incident_edges).unwrap_or_default();
        for edge in incident {
            if self.edge(edge).is_some() {
                self.remove_edge(edge)?;
            }
        }
        self.detach_from_frame(id);

        let mut node = self
            .nodes
            .remove(key)
            .ok_or(CodeLinkError::NodeNotFound(id))?;
        self.index.remove(&id);
        node.frame = None;

        log::debug!("Removed node {} ({})", id, node.class);
        self.emit(ModelEvent::NodeRemoved { node: id });
        Ok(node)
    }

    // ===== edges =====

    /// Add an edge after validating its endpoints
    ///
    /// The start must be an existing output and the end an existing, free
    /// input of a compatible kind. The edge's color is taken from the start
    /// socket. The downstream node is marked dirty.
    pub fn add_edge(&mut self, mut edge: Edge) -> Result<EdgeId> {
        if edge.id.is_nil() {
            edge.id = Uuid::new_v4();
        }
        if self.index.contains_key(&edge.id) {
            return Err(CodeLinkError::DuplicateId(edge.id));
        }
        if edge.start.direction != Direction::Output || edge.end.direction != Direction::Input {
            return Err(CodeLinkError::InvalidConnection(
                "edges run from an output socket to an input socket".to_string(),
            ));
        }

        let start_kind = self.socket_checked(edge.start)?.kind;
        let end = self.socket_checked(edge.end)?;
        if !start_kind.is_compatible_with(&end.kind) {
            return Err(CodeLinkError::InvalidConnection(format!(
                "{:?} output cannot feed {:?} input '{}'",
                start_kind, end.kind, end.name
            )));
        }
        if end.is_connected() {
            return Err(CodeLinkError::InputOccupied {
                node: edge.end.node,
                index: edge.end.index,
            });
        }

        edge.color = start_kind.color().to_string();
        let (id, start, end) = (edge.id, edge.start, edge.end);
        let key = self.edges.insert(edge);
        self.index.insert(id, DagKey::Edge(key));
        self.socket_mut(start)?.edges.push(id);
        self.socket_mut(end)?.edges.push(id);
        self.mark_dirty(end.node)?;

        log::debug!(
            "Connected {}:{} -> {}:{}",
            start.node,
            start.index,
            end.node,
            end.index
        );
        self.emit(ModelEvent::EdgeAdded {
            edge: id,
            source: start.node,
            target: end.node,
        });
        Ok(id)
    }

    /// Connect an output socket to an input socket
    pub fn connect(&mut self, start: SocketRef, end: SocketRef) -> Result<EdgeId> {
        self.add_edge(Edge::new(start, end))
    }

    /// Remove an edge, detaching it from both sockets
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge> {
        let key = match self.index.get(&id) {
            Some(DagKey::Edge(key)) => *key,
            _ => return Err(CodeLinkError::EdgeNotFound(id)),
        };
        let edge = self.edges.remove(key).ok_or(CodeLinkError::EdgeNotFound(id))?;
        self.index.remove(&id);

        for end in [edge.start, edge.end] {
            if let Ok(socket) = self.socket_mut(end) {
                socket.edges.retain(|e| *e != id);
            }
        }
        if self.node(edge.end.node).is_some() {
            self.mark_dirty(edge.end.node)?;
        }

        log::debug!(
            "Disconnected {}:{} -> {}:{}",
            edge.start.node,
            edge.start.index,
            edge.end.node,
            edge.end.index
        );
        self.emit(ModelEvent::EdgeRemoved { edge: id });
        Ok(edge)
    }

    /// The edge feeding an input socket
    pub fn incoming_edge(&self, socket: SocketRef) -> Option<&Edge> {
        if socket.direction != Direction::Input {
            return None;
        }
        let id = self.socket(socket)?.edges.first()?;
        self.edge(*id)
    }

    /// Edges leaving an output socket
    pub fn outgoing_edges(&self, socket: SocketRef) -> Vec<&Edge> {
        if socket.direction != Direction::Output {
            return Vec::new();
        }
        self.socket(socket)
            .map(|s| s.edges.iter().filter_map(|id| self.edge(*id)).collect())
            .unwrap_or_default()
    }

    // ===== frames =====

    /// Add a frame; its members leave any frame they were in
    pub fn add_frame(&mut self, mut frame: Frame) -> Result<FrameId> {
        if frame.id.is_nil() {
            frame.id = Uuid::new_v4();
        }
        let id = frame.id;
        if self.index.contains_key(&id) {
            return Err(CodeLinkError::DuplicateId(id));
        }
        for member in &frame.members {
            self.node_checked(*member)?;
        }

        for member in &frame.members {
            self.detach_from_frame(*member);
            if let Some(node) = self.node_mut(*member) {
                node.frame = Some(id);
            }
        }
        let key = self.frames.insert(frame);
        self.index.insert(id, DagKey::Frame(key));

        self.emit(ModelEvent::FrameAdded { frame: id });
        Ok(id)
    }

    /// Remove a frame; its members stay in the scene
    pub fn remove_frame(&mut self, id: FrameId) -> Result<Frame> {
        let key = self.frame_key(id)?;
        let frame = self.frames.remove(key).ok_or(CodeLinkError::FrameNotFound(id))?;
        self.index.remove(&id);
        for member in &frame.members {
            if let Some(node) = self.node_mut(*member) {
                node.frame = None;
            }
        }
        self.emit(ModelEvent::FrameRemoved { frame: id });
        Ok(frame)
    }

    /// Move `node` into `frame`
    pub fn add_to_frame(&mut self, frame: FrameId, node: NodeId) -> Result<()> {
        let key = self.frame_key(frame)?;
        self.node_checked(node)?;
        self.detach_from_frame(node);
        if let Some(f) = self.frames.get_mut(key) {
            f.members.insert(node);
        }
        self.node_checked_mut(node)?.frame = Some(frame);
        Ok(())
    }

    /// Take `node` out of its frame, returning the frame it left
    pub fn remove_from_frame(&mut self, node: NodeId) -> Result<Option<FrameId>> {
        self.node_checked(node)?;
        Ok(self.detach_from_frame(node))
    }

    fn detach_from_frame(&mut self, node: NodeId) -> Option<FrameId> {
        let frame = self.node_mut(node)?.frame.take()?;
        if let Ok(key) = self.frame_key(frame) {
            if let Some(f) = self.frames.get_mut(key) {
                f.members.remove(&node);
            }
        }
        Some(frame)
    }

    // ===== editing =====

    /// Set a node property, marking the node dirty when the value changed
    pub fn set_property(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<bool> {
        let changed = self.node_checked_mut(node)?.properties.set(key, value)?;
        if changed {
            self.mark_dirty(node)?;
            self.emit(ModelEvent::PropertyChanged {
                node,
                key: key.to_string(),
            });
        }
        Ok(changed)
    }

    /// Change the value an unconnected socket reads
    pub fn set_socket_default(&mut self, socket: SocketRef, value: impl Into<Value>) -> Result<()> {
        self.socket_mut(socket)?.default = value.into();
        self.mark_dirty(socket.node)
    }

    /// Change a socket's post-processing flags
    pub fn set_socket_flags(&mut self, socket: SocketRef, flags: SocketFlags) -> Result<()> {
        self.socket_mut(socket)?.flags = flags;
        self.mark_dirty(socket.node)
    }

    /// Mark a node's outputs stale
    ///
    /// Only this node changes state; downstream nodes notice through their
    /// input stamps when they are next pulled.
    pub fn mark_dirty(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_checked_mut(id)?;
        if node.state != NodeState::Dirty {
            node.state = NodeState::Dirty;
            self.emit(ModelEvent::NodeDirty { node: id });
        }
        Ok(())
    }

    /// Sub-graph owned by a composite node
    pub fn subgraph(&self, node: NodeId) -> Option<&Scene> {
        self.node(node)?.subgraph()
    }

    /// Mutable sub-graph of a composite node; the composite is marked dirty
    pub fn subgraph_mut(&mut self, node: NodeId) -> Result<&mut Scene> {
        self.mark_dirty(node)?;
        self.node_checked_mut(node)?
            .subgraph
            .as_deref_mut()
            .ok_or_else(|| CodeLinkError::invalid(format!("node {} has no sub-graph", node)))
    }

    /// Scene reached by descending through the composites in `path`
    pub fn scene_at(&self, path: &[NodeId]) -> Result<&Scene> {
        path.iter().try_fold(self, |scene, id| {
            scene
                .node_checked(*id)?
                .subgraph()
                .ok_or_else(|| CodeLinkError::invalid(format!("node {} has no sub-graph", id)))
        })
    }

    // ===== analytics =====

    /// Distinct nodes feeding `id`, in input order
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbours(id, Direction::Input)
    }

    /// Distinct nodes fed by `id`
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbours(id, Direction::Output)
    }

    fn neighbours(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for edge in node
            .sockets(direction)
            .iter()
            .flat_map(|s| s.edges.iter())
            .filter_map(|e| self.edge(*e))
        {
            let other = match direction {
                Direction::Input => edge.start.node,
                Direction::Output => edge.end.node,
            };
            if !out.contains(&other) {
                out.push(other);
            }
        }
        out
    }

    /// Every node `id` transitively depends on
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.reach(id, Direction::Input)
    }

    /// Every node transitively depending on `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.reach(id, Direction::Output)
    }

    fn reach(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from(self.neighbours(id, direction));
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.neighbours(next, direction));
        }
        out
    }

    /// Kahn's algorithm; nodes on or behind a cycle are left out
    fn kahn(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> =
            self.nodes.values().map(|n| (n.id, 0)).collect();
        for edge in self.edges.values() {
            *in_degree.entry(edge.end.node).or_default() += 1;
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes
            .values()
            .filter(|n| in_degree.get(&n.id) == Some(&0))
            .map(|n| n.id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let Some(node) = self.node(id) else {
                continue;
            };
            for edge in node
                .outputs
                .iter()
                .flat_map(|s| s.edges.iter())
                .filter_map(|e| self.edge(*e))
            {
                if let Some(degree) = in_degree.get_mut(&edge.end.node) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(edge.end.node);
                    }
                }
            }
        }
        order
    }

    /// Whether node-level edges form a directed cycle
    pub fn is_cyclic(&self) -> bool {
        self.kahn().len() != self.nodes.len()
    }

    /// Nodes ordered so every edge points forward
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let order = self.kahn();
        if order.len() != self.nodes.len() {
            log::warn!(
                "Cycle detected: {} of {} nodes could not be ordered",
                self.nodes.len() - order.len(),
                self.nodes.len()
            );
            return Err(CodeLinkError::CycleDetected);
        }
        Ok(order)
    }

    /// Nodes with no outgoing edges
    pub fn ends(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.outputs.iter().all(|s| s.edges.is_empty()))
            .map(|n| n.id)
            .collect()
    }

    // ===== boundary resolution =====

    /// Follow `Child` links down through nested composites
    ///
    /// Returns the composites passed through and the socket where the
    /// descent stopped.
    pub fn linked_lowest_socket(&self, socket: SocketRef) -> Result<(Vec<NodeId>, SocketRef)> {
        let mut path = Vec::new();
        let mut scene = self;
        let mut current = socket;
        loop {
            let node = scene.node_checked(current.node)?;
            let link = scene.socket_checked(current)?.link;
            match (link, node.subgraph()) {
                (Some(SocketLink::Child { node: inner, index }), Some(sub)) => {
                    path.push(current.node);
                    scene = sub;
                    current = SocketRef {
                        node: inner,
                        direction: current.direction,
                        index,
                    };
                }
                _ => return Ok((path, current)),
            }
        }
    }

    /// Follow `Parent` links up from an unconnected sub-graph input
    ///
    /// `path` lists the composites from this scene down to the one holding
    /// `socket`. Returns the remaining path and the socket that actually
    /// supplies the value.
    pub fn linked_highest_socket(
        &self,
        path: &[NodeId],
        socket: SocketRef,
    ) -> Result<(Vec<NodeId>, SocketRef)> {
        let mut path = path.to_vec();
        let mut current = socket;
        loop {
            let scene = self.scene_at(&path)?;
            let s = scene.socket_checked(current)?;
            if current.direction == Direction::Input && !s.is_connected() {
                if let Some(SocketLink::Parent { index }) = s.link {
                    if let Some(parent) = path.pop() {
                        current = SocketRef::input(parent, index);
                        continue;
                    }
                }
            }
            return Ok((path, current));
        }
    }

    // ===== outline =====

    /// Model/view tree of the scene: frames, nodes and their sockets
    pub fn outline(&self) -> Result<Tree<OutlineItem>> {
        let mut tree = Tree::new(OutlineItem::Scene).with_sink(self.sink.clone());
        let root = tree.root();
        self.outline_into(&mut tree, root)?;
        Ok(tree)
    }

    fn outline_into(
        &self,
        tree: &mut Tree<OutlineItem>,
        parent: crate::tree::ItemKey,
    ) -> Result<()> {
        for frame in self.frames.values() {
            let item = tree.append_child(
                OutlineItem::Frame {
                    id: frame.id,
                    name: frame.name.clone(),
                },
                Some(parent),
            )?;
            for member in &frame.members {
                if let Some(node) = self.node(*member) {
                    self.outline_node(tree, item, node)?;
                }
            }
        }
        for node in self.nodes.values().filter(|n| n.frame.is_none()) {
            self.outline_node(tree, parent, node)?;
        }
        Ok(())
    }

    fn outline_node(
        &self,
        tree: &mut Tree<OutlineItem>,
        parent: crate::tree::ItemKey,
        node: &Node,
    ) -> Result<()> {
        let item = tree.append_child(
            OutlineItem::Node {
                id: node.id,
                class: node.class.clone(),
                name: node.name().to_string(),
            },
            Some(parent),
        )?;
        for direction in [Direction::Input, Direction::Output] {
            for (index, socket) in node.sockets(direction).iter().enumerate() {
                tree.append_child(
                    OutlineItem::Socket {
                        node: node.id,
                        direction,
                        index,
                        name: socket.name.clone(),
                    },
                    Some(item),
                )?;
            }
        }
        if let Some(sub) = node.subgraph() {
            sub.outline_into(tree, item)?;
        }
        Ok(())
    }
}

/// A row of the scene outline
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineItem {
    Scene,
    Frame { id: FrameId, name: String },
    Node { id: NodeId, class: String, name: String },
    Socket {
        node: NodeId,
        direction: Direction,
        index: usize,
        name: String,
    },
}

impl TreeData for OutlineItem {
    fn class(&self) -> &str {
        match self {
            OutlineItem::Scene => "Scene",
            OutlineItem::Frame { .. } => "Frame",
            OutlineItem::Node { .. } => "Node",
            OutlineItem::Socket { .. } => "Socket",
        }
    }

    fn fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        match self {
            OutlineItem::Scene => {}
            OutlineItem::Frame { id, name } => {
                map.insert("Frame".into(), id.to_string().into());
                map.insert("Name".into(), name.clone().into());
            }
            OutlineItem::Node { id, class, name } => {
                map.insert("Node".into(), id.to_string().into());
                map.insert("NodeClass".into(), class.clone().into());
                map.insert("Name".into(), name.clone().into());
            }
            OutlineItem::Socket {
                node,
                direction,
                index,
                name,
            } => {
                map.insert("Node".into(), node.to_string().into());
                map.insert(
                    "Direction".into(),
                    serde_json::to_value(direction).unwrap_or_default(),
                );
                map.insert("Index".into(), (*index).into());
                map.insert("Name".into(), name.clone().into());
            }
        }
        map
    }
}
