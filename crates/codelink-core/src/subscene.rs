//! Composite nodes: folding a selection into a sub-graph and back
//!
//! Folding moves a set of nodes into a composite node's sub-graph. Edges
//! strictly inside the selection move with it, frames whose members are all
//! selected move too, and every edge crossing the selection boundary is
//! re-terminated at a new proxy socket on the composite node:
//!
//! - each incoming edge gets its own composite input, linked to the inner
//!   input it used to feed
//! - each inner output with outgoing edges gets one composite output shared
//!   by all of those edges
//!
//! The proxy pairing is recorded three ways that always agree: the
//! composite socket's `Child` link, the inner socket's `Parent` link, and
//! the composite's pin map. Edge ids survive the round trip.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CodeLinkError, Result};
use crate::events::ModelEvent;
use crate::node::{Node, PinMap};
use crate::scene::Scene;
use crate::socket::{Socket, SocketLink};
use crate::types::{Direction, Edge, EdgeId, Frame, FrameId, NodeId, SocketRef};
use crate::value::Value;

/// Edges touching a selection, classified by which ends are selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryEdges {
    /// Both ends inside
    pub internal: Vec<EdgeId>,
    /// Producer outside, consumer inside
    pub incoming: Vec<EdgeId>,
    /// Producer inside, consumer outside
    pub outgoing: Vec<EdgeId>,
}

/// What a fold moved and created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldReport {
    pub composite: NodeId,
    /// Nodes now living in the sub-graph
    pub nodes: Vec<NodeId>,
    /// Edges now living in the sub-graph
    pub internal_edges: Vec<EdgeId>,
    /// Frames now living in the sub-graph
    pub frames: Vec<FrameId>,
    /// Indices of the composite inputs created
    pub inputs: Vec<usize>,
    /// Indices of the composite outputs created
    pub outputs: Vec<usize>,
}

impl Scene {
    /// Classify the edges touching `members`
    pub fn boundary_edges(&self, members: &[NodeId]) -> BoundaryEdges {
        let selected: HashSet<NodeId> = members.iter().copied().collect();
        let mut result = BoundaryEdges::default();
        for edge in self.edges() {
            let source_inside = selected.contains(&edge.start.node);
            let target_inside = selected.contains(&edge.end.node);
            match (source_inside, target_inside) {
                (true, true) => result.internal.push(edge.id),
                (false, true) => result.incoming.push(edge.id),
                (true, false) => result.outgoing.push(edge.id),
                (false, false) => {}
            }
        }
        result
    }

    /// Fold `members` into the sub-graph of `composite`
    ///
    /// The composite keeps any sockets it already had; new proxy sockets are
    /// appended after them. Fails without changing the scene when the
    /// composite has no sub-graph, is itself selected or directly connected
    /// to the selection, or when a member is already a boundary proxy.
    pub fn populate_sub_scene(
        &mut self,
        composite: NodeId,
        members: &[NodeId],
    ) -> Result<FoldReport> {
        let mut selection: Vec<NodeId> = Vec::with_capacity(members.len());
        for id in members {
            if !selection.contains(id) {
                selection.push(*id);
            }
        }
        self.check_foldable(composite, &selection)?;

        let selected: HashSet<NodeId> = selection.iter().copied().collect();
        let boundary = self.boundary_edges(&selection);
        let snapshot = |ids: &[EdgeId]| -> Vec<Edge> {
            ids.iter().filter_map(|id| self.edge(*id).cloned()).collect()
        };
        let internal = snapshot(&boundary.internal);
        let incoming = snapshot(&boundary.incoming);
        let outgoing = snapshot(&boundary.outgoing);
        let frame_ids: Vec<FrameId> = self
            .frames()
            .filter(|f| !f.members.is_empty() && f.members.iter().all(|m| selected.contains(m)))
            .map(|f| f.id)
            .collect();

        for edge in internal.iter().chain(&incoming).chain(&outgoing) {
            self.remove_edge(edge.id)?;
        }
        let frames = frame_ids
            .iter()
            .map(|id| self.remove_frame(*id))
            .collect::<Result<Vec<Frame>>>()?;
        let nodes = selection
            .iter()
            .map(|id| self.remove_node(*id))
            .collect::<Result<Vec<Node>>>()?;

        let mut sub = self
            .node_checked_mut(composite)?
            .subgraph
            .take()
            .map(|b| *b)
            .unwrap_or_default();
        let outcome = self.fold_into(
            composite, &mut sub, nodes, &internal, frames, &incoming, &outgoing,
        );
        self.node_checked_mut(composite)?.subgraph = Some(Box::new(sub));
        let (reconnect, inputs, outputs) = outcome?;

        for edge in reconnect {
            self.add_edge(edge)?;
        }
        self.mark_dirty(composite)?;

        log::info!(
            "Folded {} nodes into composite {} ({} inputs, {} outputs)",
            selection.len(),
            composite,
            inputs.len(),
            outputs.len()
        );
        self.emit(ModelEvent::SubSceneFolded {
            composite,
            nodes: selection.clone(),
        });

        Ok(FoldReport {
            composite,
            nodes: selection,
            internal_edges: internal.iter().map(|e| e.id).collect(),
            frames: frame_ids,
            inputs,
            outputs,
        })
    }

    fn check_foldable(&self, composite: NodeId, selection: &[NodeId]) -> Result<()> {
        if !self.node_checked(composite)?.is_composite() {
            return Err(CodeLinkError::invalid(format!(
                "node {} has no sub-graph",
                composite
            )));
        }
        if selection.is_empty() {
            return Err(CodeLinkError::invalid("nothing selected to fold"));
        }
        if selection.contains(&composite) {
            return Err(CodeLinkError::invalid("a composite cannot be folded into itself"));
        }
        for id in selection {
            let node = self.node_checked(*id)?;
            let proxied = node
                .inputs()
                .iter()
                .chain(node.outputs())
                .any(|s| matches!(s.link(), Some(SocketLink::Parent { .. })));
            if proxied {
                return Err(CodeLinkError::invalid(format!(
                    "node {} is a boundary proxy of the enclosing composite",
                    id
                )));
            }
        }
        let touches_composite = self
            .edges()
            .filter(|e| selection.contains(&e.start.node) || selection.contains(&e.end.node))
            .any(|e| e.start.node == composite || e.end.node == composite);
        if touches_composite {
            return Err(CodeLinkError::invalid(
                "selection is connected directly to the composite",
            ));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn fold_into(
        &mut self,
        composite: NodeId,
        sub: &mut Scene,
        nodes: Vec<Node>,
        internal: &[Edge],
        frames: Vec<Frame>,
        incoming: &[Edge],
        outgoing: &[Edge],
    ) -> Result<(Vec<Edge>, Vec<usize>, Vec<usize>)> {
        for node in nodes {
            sub.add_node(node)?;
        }
        for edge in internal {
            sub.add_edge(edge.clone())?;
        }
        for frame in frames {
            sub.add_frame(frame)?;
        }

        let mut reconnect = Vec::with_capacity(incoming.len() + outgoing.len());
        let mut inputs = Vec::new();
        for edge in incoming {
            let index = self.expose(composite, sub, edge.end)?;
            inputs.push(index);
            reconnect.push(Edge {
                end: SocketRef::input(composite, index),
                ..edge.clone()
            });
        }

        let mut exposed: Vec<(SocketRef, usize)> = Vec::new();
        for edge in outgoing {
            let index = match exposed.iter().find(|(inner, _)| *inner == edge.start) {
                Some((_, index)) => *index,
                None => {
                    let index = self.expose(composite, sub, edge.start)?;
                    exposed.push((edge.start, index));
                    index
                }
            };
            reconnect.push(Edge {
                start: SocketRef::output(composite, index),
                ..edge.clone()
            });
        }
        let outputs = exposed.into_iter().map(|(_, index)| index).collect();

        Ok((reconnect, inputs, outputs))
    }

    /// Create a composite socket proxying `inner` and link the pair
    fn expose(&mut self, composite: NodeId, sub: &mut Scene, inner: SocketRef) -> Result<usize> {
        let template = sub.socket_checked(inner)?;
        let proxy = Socket::new(template.name.clone(), inner.direction, template.kind)
            .with_default(template.default.clone())
            .with_link(SocketLink::Child {
                node: inner.node,
                index: inner.index,
            });

        let node = self.node_checked_mut(composite)?;
        let index = node.push_socket(proxy);
        node.pin_map.insert(index, inner);
        sub.socket_mut(inner)?.link = Some(SocketLink::Parent { index });
        Ok(index)
    }

    /// Expand a composite's sub-graph back into this scene
    ///
    /// Inner nodes, edges and frames move up with their ids. Edges that
    /// ended at composite proxies are re-terminated at the inner sockets
    /// behind them, and unconnected composite inputs hand their default to
    /// the inner socket. The composite is left with an empty sub-graph and
    /// no sockets; edges on sockets without a pin go with them. Returns the
    /// ids of the nodes moved out.
    pub fn resolve_sub_scene(&mut self, composite: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node_checked(composite)?;
        let sub = node.subgraph().ok_or_else(|| {
            CodeLinkError::invalid(format!("node {} has no sub-graph", composite))
        })?;
        let clash = sub
            .nodes()
            .map(|n| n.id)
            .chain(sub.edges().map(|e| e.id))
            .chain(sub.frames().map(|f| f.id))
            .find(|id| self.contains(*id));
        if let Some(id) = clash {
            return Err(CodeLinkError::DuplicateId(id));
        }

        let pin_map = node.pin_map.clone();
        let defaults: Vec<Value> = node.inputs().iter().map(|s| s.default.clone()).collect();
        let incoming = self.proxy_edges(node, Direction::Input);
        let outgoing = self.proxy_edges(node, Direction::Output);

        for (_, edge) in incoming.iter().chain(&outgoing) {
            self.remove_edge(edge.id)?;
        }

        let sink = self.sink();
        let node = self.node_checked_mut(composite)?;
        let mut sub = node
            .subgraph
            .replace(Box::new(Scene::new().with_sink(sink)))
            .map(|b| *b)
            .unwrap_or_default();
        node.inputs.clear();
        node.outputs.clear();
        node.slots.clear();
        node.pin_map = PinMap::default();

        let edges: Vec<Edge> = sub.edges().cloned().collect();
        let frames: Vec<Frame> = sub.frames().cloned().collect();
        let ids = sub.node_ids();
        for id in &ids {
            let mut inner = sub.remove_node(*id)?;
            for socket in inner.inputs.iter_mut().chain(inner.outputs.iter_mut()) {
                if matches!(socket.link, Some(SocketLink::Parent { .. })) {
                    socket.link = None;
                }
            }
            self.add_node(inner)?;
        }
        for edge in edges {
            self.add_edge(edge)?;
        }
        for frame in frames {
            self.add_frame(frame)?;
        }

        for (&index, target) in &pin_map.inputs {
            match incoming.iter().find(|(k, _)| *k == index) {
                Some((_, edge)) => {
                    self.add_edge(Edge {
                        end: *target,
                        ..edge.clone()
                    })?;
                }
                None => {
                    if let Some(default) = defaults.get(index) {
                        self.set_socket_default(*target, default.clone())?;
                    }
                }
            }
        }
        for (index, edge) in outgoing {
            let Some(source) = pin_map.get(Direction::Output, index) else {
                log::debug!("Dropping edge {} from unmapped output {}", edge.id, index);
                continue;
            };
            self.add_edge(Edge {
                start: source,
                ..edge
            })?;
        }
        self.mark_dirty(composite)?;

        log::info!("Resolved composite {} into {} nodes", composite, ids.len());
        self.emit(ModelEvent::SubSceneResolved {
            composite,
            nodes: ids.clone(),
        });
        Ok(ids)
    }

    fn proxy_edges(&self, node: &Node, direction: Direction) -> Vec<(usize, Edge)> {
        node.sockets(direction)
            .iter()
            .enumerate()
            .flat_map(|(index, socket)| {
                socket
                    .edges()
                    .iter()
                    .filter_map(|id| self.edge(*id))
                    .map(move |edge| (index, edge.clone()))
            })
            .collect()
    }
}
