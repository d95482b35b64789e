//! Scene validation
//!
//! The scene's editing API keeps most invariants on its own; this pass
//! re-checks them after loading or bulk manipulation, and reports
//! everything it finds rather than stopping at the first problem.

use std::collections::{BTreeSet, HashSet};

use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::scene::Scene;
use crate::socket::SocketLink;
use crate::types::{Direction, EdgeId, FrameId, NodeId, SocketRef};

/// Validation finding with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Node-level edges form a directed cycle
    CycleDetected,
    /// A node's class is not in the registry
    UnknownClass { node: NodeId, class: String },
    /// An edge references a node that does not exist
    UnknownNode { edge: EdgeId, node: NodeId },
    /// An edge references a socket index that does not exist
    UnknownSocket { edge: EdgeId, socket: SocketRef },
    /// An edge does not run from an output to an input
    DirectionMismatch { edge: EdgeId },
    /// An edge joins sockets of incompatible kinds
    IncompatibleKinds { edge: EdgeId },
    /// An edge is missing from one of its sockets' edge lists
    UnlistedEdge { edge: EdgeId, socket: SocketRef },
    /// An input socket has more than one incoming edge
    MultipleIncoming { node: NodeId, index: usize },
    /// A composite socket, its pin map entry and the inner socket disagree
    PinMapMismatch {
        node: NodeId,
        direction: Direction,
        index: usize,
    },
    /// A node and a frame disagree about membership
    FrameMembership { frame: FrameId, node: NodeId },
    /// A finding inside a composite node's sub-graph
    InSubgraph {
        composite: NodeId,
        error: Box<ValidationError>,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
            Self::UnknownClass { node, class } => {
                write!(f, "Unknown class '{}' for node '{}'", class, node)
            }
            Self::UnknownNode { edge, node } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge, node)
            }
            Self::UnknownSocket { edge, socket } => write!(
                f,
                "Edge '{}' references missing {:?} socket {} on node '{}'",
                edge, socket.direction, socket.index, socket.node
            ),
            Self::DirectionMismatch { edge } => {
                write!(f, "Edge '{}' does not run from an output to an input", edge)
            }
            Self::IncompatibleKinds { edge } => {
                write!(f, "Edge '{}' connects incompatible socket kinds", edge)
            }
            Self::UnlistedEdge { edge, socket } => write!(
                f,
                "Edge '{}' is not listed on {:?} socket {} of node '{}'",
                edge, socket.direction, socket.index, socket.node
            ),
            Self::MultipleIncoming { node, index } => write!(
                f,
                "Input {} on node '{}' has more than one incoming edge",
                index, node
            ),
            Self::PinMapMismatch {
                node,
                direction,
                index,
            } => write!(
                f,
                "Composite '{}' {:?} pin {} is inconsistent with its sub-graph",
                node, direction, index
            ),
            Self::FrameMembership { frame, node } => write!(
                f,
                "Node '{}' and frame '{}' disagree about membership",
                node, frame
            ),
            Self::InSubgraph { composite, error } => {
                write!(f, "In sub-graph of '{}': {}", composite, error)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a scene and every nested sub-graph
///
/// Returns all validation errors found (not just the first). Pass a
/// registry to also check node classes.
pub fn validate_scene(scene: &Scene, registry: Option<&NodeRegistry>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_edges(scene, &mut errors);
    validate_inputs(scene, &mut errors);
    validate_frames(scene, &mut errors);
    if scene.is_cyclic() {
        errors.push(ValidationError::CycleDetected);
    }
    if let Some(reg) = registry {
        validate_classes(scene, reg, &mut errors);
    }

    for node in scene.nodes() {
        if let Some(sub) = node.subgraph() {
            validate_pin_map(node, sub, &mut errors);
            errors.extend(
                validate_scene(sub, registry)
                    .into_iter()
                    .map(|error| ValidationError::InSubgraph {
                        composite: node.id,
                        error: Box::new(error),
                    }),
            );
        }
    }

    errors
}

/// Check that every edge joins existing sockets that know about it
fn validate_edges(scene: &Scene, errors: &mut Vec<ValidationError>) {
    for edge in scene.edges() {
        if edge.start.direction != Direction::Output || edge.end.direction != Direction::Input {
            errors.push(ValidationError::DirectionMismatch { edge: edge.id });
        }

        let mut kinds = Vec::with_capacity(2);
        for end in [edge.start, edge.end] {
            if scene.node(end.node).is_none() {
                errors.push(ValidationError::UnknownNode {
                    edge: edge.id,
                    node: end.node,
                });
                continue;
            }
            match scene.socket(end) {
                None => errors.push(ValidationError::UnknownSocket {
                    edge: edge.id,
                    socket: end,
                }),
                Some(socket) => {
                    if !socket.edges().contains(&edge.id) {
                        errors.push(ValidationError::UnlistedEdge {
                            edge: edge.id,
                            socket: end,
                        });
                    }
                    kinds.push(socket.kind);
                }
            }
        }

        if let &[source, target] = kinds.as_slice() {
            if !source.is_compatible_with(&target) {
                errors.push(ValidationError::IncompatibleKinds { edge: edge.id });
            }
        }
    }
}

/// Check the one-edge-per-input rule
fn validate_inputs(scene: &Scene, errors: &mut Vec<ValidationError>) {
    for node in scene.nodes() {
        for (index, socket) in node.inputs().iter().enumerate() {
            if socket.edges().len() > 1 {
                errors.push(ValidationError::MultipleIncoming {
                    node: node.id,
                    index,
                });
            }
        }
    }
}

/// Check that frames and nodes agree about membership
fn validate_frames(scene: &Scene, errors: &mut Vec<ValidationError>) {
    let mut claimed = HashSet::new();
    for frame in scene.frames() {
        for member in &frame.members {
            claimed.insert(*member);
            if scene.node(*member).and_then(Node::frame) != Some(frame.id) {
                errors.push(ValidationError::FrameMembership {
                    frame: frame.id,
                    node: *member,
                });
            }
        }
    }
    for node in scene.nodes() {
        if let Some(frame) = node.frame() {
            if !claimed.contains(&node.id) {
                errors.push(ValidationError::FrameMembership {
                    frame,
                    node: node.id,
                });
            }
        }
    }
}

/// Check that all nodes have known classes in the registry
fn validate_classes(scene: &Scene, registry: &NodeRegistry, errors: &mut Vec<ValidationError>) {
    for node in scene.nodes() {
        if !registry.has_class(&node.class) {
            errors.push(ValidationError::UnknownClass {
                node: node.id,
                class: node.class.clone(),
            });
        }
    }
}

/// Check that each composite socket, its pin and the inner socket agree
fn validate_pin_map(node: &Node, sub: &Scene, errors: &mut Vec<ValidationError>) {
    for direction in [Direction::Input, Direction::Output] {
        let sockets = node.sockets(direction);
        let pins = node.pin_map().side(direction);
        // Sockets without a pin or a child link are plain composite sockets
        let proxied = sockets
            .iter()
            .enumerate()
            .filter(|(_, socket)| matches!(socket.link(), Some(SocketLink::Child { .. })))
            .map(|(index, _)| index);
        let indices: BTreeSet<usize> = pins.keys().copied().chain(proxied).collect();

        for index in indices {
            let consistent = match (sockets.get(index), pins.get(&index)) {
                (Some(socket), Some(pin)) => {
                    let child = socket.link()
                        == Some(SocketLink::Child {
                            node: pin.node,
                            index: pin.index,
                        });
                    let parent = sub
                        .socket(*pin)
                        .is_some_and(|inner| inner.link() == Some(SocketLink::Parent { index }));
                    child && parent && pin.direction == direction
                }
                _ => false,
            };
            if !consistent {
                errors.push(ValidationError::PinMapMismatch {
                    node: node.id,
                    direction,
                    index,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeDescriptor, SocketSpec};
    use crate::registry::COMPOSITE_CLASS;
    use crate::types::{Frame, NodeCategory, SocketKind};

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_descriptor(
            NodeDescriptor::new("test.Pass", NodeCategory::Math, "Pass")
                .input(SocketSpec::new("In", SocketKind::Scalar))
                .output(SocketSpec::new("Out", SocketKind::Scalar)),
        );
        registry
    }

    fn chain(registry: &NodeRegistry, len: usize) -> (Scene, Vec<NodeId>) {
        let mut scene = Scene::new();
        let ids: Vec<NodeId> = (0..len)
            .map(|_| scene.add_node(registry.create("test.Pass").unwrap()).unwrap())
            .collect();
        for pair in ids.windows(2) {
            scene
                .connect(SocketRef::output(pair[0], 0), SocketRef::input(pair[1], 0))
                .unwrap();
        }
        (scene, ids)
    }

    #[test]
    fn test_valid_scene() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 3);
        let mut frame = Frame::new("F");
        frame.members.insert(ids[0]);
        scene.add_frame(frame).unwrap();

        let d = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
        scene.populate_sub_scene(d, &[ids[1]]).unwrap();

        let errors = validate_scene(&scene, Some(&registry));
        assert!(errors.is_empty(), "unexpected findings: {:?}", errors);
    }

    #[test]
    fn test_cycle_and_unknown_class() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 2);
        scene
            .connect(SocketRef::output(ids[1], 0), SocketRef::input(ids[0], 0))
            .unwrap();

        let errors = validate_scene(&scene, Some(&NodeRegistry::new()));
        assert!(errors.contains(&ValidationError::CycleDetected));
        let unknown = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::UnknownClass { .. }))
            .count();
        assert_eq!(unknown, 2);
    }

    #[test]
    fn test_multiple_incoming() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 2);
        let extra = scene.edges().next().unwrap().id;
        scene.node_mut(ids[1]).unwrap().inputs[0].edges.push(extra);

        let errors = validate_scene(&scene, None);
        assert_eq!(
            errors,
            vec![ValidationError::MultipleIncoming {
                node: ids[1],
                index: 0
            }]
        );
    }

    #[test]
    fn test_unlisted_edge() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 2);
        let edge = scene.edges().next().unwrap().id;
        scene.node_mut(ids[0]).unwrap().outputs[0].edges.clear();

        let errors = validate_scene(&scene, None);
        assert_eq!(
            errors,
            vec![ValidationError::UnlistedEdge {
                edge,
                socket: SocketRef::output(ids[0], 0)
            }]
        );
    }

    #[test]
    fn test_frame_membership_mismatch() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 1);
        let mut frame = Frame::new("F");
        frame.members.insert(ids[0]);
        let frame = scene.add_frame(frame).unwrap();
        scene.node_mut(ids[0]).unwrap().frame = None;

        let errors = validate_scene(&scene, None);
        assert_eq!(
            errors,
            vec![ValidationError::FrameMembership {
                frame,
                node: ids[0]
            }]
        );
    }

    #[test]
    fn test_broken_pin_map_is_reported() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 3);
        let d = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
        scene.populate_sub_scene(d, &[ids[1]]).unwrap();

        scene.node_mut(d).unwrap().pin_map.outputs.clear();
        let errors = validate_scene(&scene, None);
        assert_eq!(
            errors,
            vec![ValidationError::PinMapMismatch {
                node: d,
                direction: Direction::Output,
                index: 0
            }]
        );
    }

    #[test]
    fn test_sub_graph_findings_are_wrapped() {
        let registry = registry();
        let (mut scene, ids) = chain(&registry, 3);
        let d = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
        scene.populate_sub_scene(d, &[ids[1]]).unwrap();

        let errors = validate_scene(&scene, Some(&NodeRegistry::new()));
        assert!(errors.contains(&ValidationError::InSubgraph {
            composite: d,
            error: Box::new(ValidationError::UnknownClass {
                node: ids[1],
                class: "test.Pass".to_string()
            }),
        }));
        assert!(errors[0].to_string().starts_with("Unknown class"));
    }
}
