//! Scene persistence
//!
//! Scenes are stored as PascalCase JSON dictionaries:
//!
//! ```text
//! {
//!   "Nodes":  [{ "Id", "Properties": { "Class", "Name", ... },
//!               "Inputs": [socket], "Outputs": [socket],
//!               "Subgraph"?: { "Nodes", "Edges", "Frames", "PinMap" } }],
//!   "Edges":  [{ "Id", "Start": [node, index], "End": [node, index], "Color" }],
//!   "Frames": [{ "Id", "Name", "Members": [node] }]
//! }
//! ```
//!
//! Node classes are resolved through an injected [`NodeRegistry`]. Ids are
//! preserved; evaluation state is not persisted and every loaded node
//! starts `Dirty`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::error::{CodeLinkError, Result};
use crate::node::{Node, PinMap};
use crate::property::{keys, PropertyValue};
use crate::registry::NodeRegistry;
use crate::scene::Scene;
use crate::socket::{Socket, SocketFlags, SocketLink};
use crate::types::{Direction, Edge, Frame, SocketKind, SocketRef};
use crate::value::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SceneDict {
    #[serde(default)]
    nodes: Vec<NodeDict>,
    #[serde(default)]
    edges: Vec<EdgeDict>,
    #[serde(default)]
    frames: Vec<FrameDict>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeDict {
    id: Uuid,
    properties: Map<String, JsonValue>,
    #[serde(default)]
    inputs: Vec<SocketDict>,
    #[serde(default)]
    outputs: Vec<SocketDict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subgraph: Option<SubgraphDict>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubgraphDict {
    #[serde(flatten)]
    scene: SceneDict,
    #[serde(default)]
    pin_map: PinMapDict,
}

/// Composite socket index to `[inner node, inner socket index]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinMapDict {
    #[serde(default)]
    inputs: BTreeMap<usize, (Uuid, usize)>,
    #[serde(default)]
    outputs: BTreeMap<usize, (Uuid, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SocketDict {
    name: String,
    direction: Direction,
    kind: SocketKind,
    #[serde(default)]
    default: Value,
    #[serde(default)]
    link: Option<SocketLink>,
    #[serde(flatten)]
    flags: SocketFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EdgeDict {
    id: Uuid,
    start: (Uuid, usize),
    end: (Uuid, usize),
    #[serde(default)]
    color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FrameDict {
    id: Uuid,
    name: String,
    #[serde(default)]
    members: Vec<Uuid>,
}

// ===== writing =====

/// Serialize a scene, sub-graphs included
pub fn to_dict(scene: &Scene) -> Result<JsonValue> {
    Ok(serde_json::to_value(scene_dict(scene)?)?)
}

/// Pretty-printed JSON
pub fn to_string(scene: &Scene) -> Result<String> {
    Ok(serde_json::to_string_pretty(&scene_dict(scene)?)?)
}

/// Write a scene to `path` as JSON
pub fn save(scene: &Scene, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_string(scene)?)?;
    log::debug!("Saved scene with {} nodes to {:?}", scene.node_count(), path);
    Ok(())
}

fn scene_dict(scene: &Scene) -> Result<SceneDict> {
    Ok(SceneDict {
        nodes: scene.nodes().map(node_dict).collect::<Result<_>>()?,
        edges: scene
            .edges()
            .map(|e| EdgeDict {
                id: e.id,
                start: (e.start.node, e.start.index),
                end: (e.end.node, e.end.index),
                color: e.color.clone(),
            })
            .collect(),
        frames: scene
            .frames()
            .map(|f| FrameDict {
                id: f.id,
                name: f.name.clone(),
                members: f.members.iter().copied().collect(),
            })
            .collect(),
    })
}

fn node_dict(node: &Node) -> Result<NodeDict> {
    let mut properties = Map::new();
    properties.insert(keys::CLASS.to_string(), JsonValue::from(node.class.clone()));
    properties.extend(node.properties().to_dict()?);

    let subgraph = match node.subgraph() {
        Some(sub) => Some(SubgraphDict {
            scene: scene_dict(sub)?,
            pin_map: PinMapDict {
                inputs: pin_side(&node.pin_map().inputs),
                outputs: pin_side(&node.pin_map().outputs),
            },
        }),
        None => None,
    };

    Ok(NodeDict {
        id: node.id,
        properties,
        inputs: node.inputs().iter().map(socket_dict).collect(),
        outputs: node.outputs().iter().map(socket_dict).collect(),
        subgraph,
    })
}

fn pin_side(pins: &BTreeMap<usize, SocketRef>) -> BTreeMap<usize, (Uuid, usize)> {
    pins.iter()
        .map(|(index, pin)| (*index, (pin.node, pin.index)))
        .collect()
}

fn socket_dict(socket: &Socket) -> SocketDict {
    SocketDict {
        name: socket.name.clone(),
        direction: socket.direction(),
        kind: socket.kind,
        default: persistable(&socket.default),
        link: socket.link(),
        flags: socket.flags,
    }
}

/// Runtime-only shape handles persist as `Null`
fn persistable(value: &Value) -> Value {
    match value {
        Value::Shape(_) => Value::Null,
        Value::List(items) => Value::List(items.iter().map(persistable).collect()),
        Value::Wrapped(inner) => Value::Wrapped(Box::new(persistable(inner))),
        other => other.clone(),
    }
}

// ===== reading =====

/// Rebuild a scene from [`to_dict`] output
pub fn from_dict(dict: &JsonValue, registry: &NodeRegistry) -> Result<Scene> {
    let parsed: SceneDict = serde_json::from_value(dict.clone())?;
    build_scene(parsed, registry)
}

pub fn from_str(json: &str, registry: &NodeRegistry) -> Result<Scene> {
    let parsed: SceneDict = serde_json::from_str(json)?;
    build_scene(parsed, registry)
}

/// Read a scene written by [`save`]
pub fn load(path: impl AsRef<Path>, registry: &NodeRegistry) -> Result<Scene> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let scene = from_str(&content, registry)?;
    log::info!("Loaded scene with {} nodes from {:?}", scene.node_count(), path);
    Ok(scene)
}

fn build_scene(dict: SceneDict, registry: &NodeRegistry) -> Result<Scene> {
    let mut scene = Scene::new();
    for node in dict.nodes {
        scene.add_node(build_node(node, registry)?)?;
    }
    for edge in dict.edges {
        scene.add_edge(Edge {
            id: edge.id,
            start: SocketRef::output(edge.start.0, edge.start.1),
            end: SocketRef::input(edge.end.0, edge.end.1),
            color: edge.color,
        })?;
    }
    for frame in dict.frames {
        scene.add_frame(Frame {
            id: frame.id,
            name: frame.name,
            members: frame.members.into_iter().collect(),
        })?;
    }
    Ok(scene)
}

fn build_node(dict: NodeDict, registry: &NodeRegistry) -> Result<Node> {
    let class = dict
        .properties
        .get(keys::CLASS)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| CodeLinkError::invalid(format!("node {} has no Class", dict.id)))?;
    let mut node = registry.create(class)?.with_id(dict.id);

    for (key, value) in &dict.properties {
        if key == keys::CLASS {
            continue;
        }
        let value: PropertyValue = serde_json::from_value(value.clone())?;
        if node.properties.contains(key) {
            node.properties.set(key, value)?;
        } else {
            node.properties.define(key.clone(), value);
        }
    }

    node.inputs = dict
        .inputs
        .into_iter()
        .map(|s| build_socket(s, Direction::Input))
        .collect();
    node.outputs = dict
        .outputs
        .into_iter()
        .map(|s| build_socket(s, Direction::Output))
        .collect();
    node.reset_cache();

    if let Some(sub) = dict.subgraph {
        node.pin_map = PinMap {
            inputs: pin_refs(&sub.pin_map.inputs, Direction::Input, node.inputs.len())?,
            outputs: pin_refs(&sub.pin_map.outputs, Direction::Output, node.outputs.len())?,
        };
        node.subgraph = Some(Box::new(build_scene(sub.scene, registry)?));
    }
    Ok(node)
}

fn build_socket(dict: SocketDict, direction: Direction) -> Socket {
    let socket = Socket::new(dict.name, direction, dict.kind)
        .with_default(dict.default)
        .with_flags(dict.flags);
    match dict.link {
        Some(link) => socket.with_link(link),
        None => socket,
    }
}

fn pin_refs(
    side: &BTreeMap<usize, (Uuid, usize)>,
    direction: Direction,
    sockets: usize,
) -> Result<BTreeMap<usize, SocketRef>> {
    side.iter()
        .map(|(index, (node, inner))| {
            if *index >= sockets {
                return Err(CodeLinkError::invalid(format!(
                    "pin map names {:?} socket {} of {}",
                    direction, index, sockets
                )));
            }
            let pin = SocketRef {
                node: *node,
                direction,
                index: *inner,
            };
            Ok((*index, pin))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeDescriptor, SocketSpec};
    use crate::registry::COMPOSITE_CLASS;
    use crate::types::{NodeCategory, NodeState};

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

    fn sample(registry: &NodeRegistry) -> Scene {
        let mut scene = Scene::new();
        let a = scene.add_node(registry.create("test.Number").unwrap()).unwrap();
        let b = scene.add_node(registry.create("test.Add").unwrap()).unwrap();
        let c = scene.add_node(registry.create("test.Add").unwrap()).unwrap();
        scene.set_property(a, "Value", 5.0).unwrap();
        scene.set_property(b, keys::NAME, "Adder").unwrap();
        scene
            .set_socket_flags(SocketRef::input(b, 1), SocketFlags::graft())
            .unwrap();
        scene
            .connect(SocketRef::output(a, 0), SocketRef::input(b, 0))
            .unwrap();
        scene
            .connect(SocketRef::output(b, 0), SocketRef::input(c, 0))
            .unwrap();
        let mut frame = Frame::new("Inputs");
        frame.members.insert(a);
        scene.add_frame(frame).unwrap();
        scene
    }

    #[test]
    fn test_dict_layout() {
        let registry = registry();
        let scene = sample(&registry);
        let dict = to_dict(&scene).unwrap();

        assert_eq!(dict["Nodes"].as_array().unwrap().len(), 3);
        assert_eq!(dict["Edges"].as_array().unwrap().len(), 2);
        assert_eq!(dict["Frames"][0]["Name"], "Inputs");

        let node = &dict["Nodes"][0];
        assert_eq!(node["Properties"]["Class"], "test.Number");
        assert_eq!(node["Properties"]["Value"], 5.0);
        assert_eq!(node["Outputs"][0]["Name"], "Value");
        assert_eq!(node["Outputs"][0]["Direction"], "output");
        assert!(node.get("Subgraph").is_none());

        let adder = &dict["Nodes"][1];
        assert_eq!(adder["Inputs"][1]["Graft"], true);
        assert_eq!(adder["Inputs"][1]["Flatten"], false);
    }

    #[test]
    fn test_round_trip() {
        let registry = registry();
        let scene = sample(&registry);
        let dict = to_dict(&scene).unwrap();

        let restored = from_dict(&dict, &registry).unwrap();
        assert_eq!(to_dict(&restored).unwrap(), dict);
        assert_eq!(restored.node_count(), 3);
        assert!(restored
            .nodes()
            .all(|n| n.state() == NodeState::Dirty && !n.is_cached(0)));
    }

    #[test]
    fn test_round_trip_with_sub_graph() {
        let registry = registry();
        let mut scene = sample(&registry);
        let b = scene
            .nodes()
            .find(|n| n.name() == "Adder")
            .map(|n| n.id)
            .unwrap();
        let d = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
        scene.populate_sub_scene(d, &[b]).unwrap();

        let dict = to_dict(&scene).unwrap();
        let composite = dict["Nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n.get("Subgraph").is_some())
            .unwrap();
        assert_eq!(composite["Subgraph"]["PinMap"]["Inputs"]["0"][0], b.to_string());

        let restored = from_dict(&dict, &registry).unwrap();
        assert_eq!(to_dict(&restored).unwrap(), dict);

        let node = restored.node(d).unwrap();
        assert_eq!(node.pin_map().get(Direction::Input, 0), Some(SocketRef::input(b, 0)));
        assert!(node.subgraph().unwrap().node(b).is_some());
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let registry = registry();
        let scene = sample(&registry);
        let dict = to_dict(&scene).unwrap();

        let err = from_dict(&dict, &NodeRegistry::new()).unwrap_err();
        assert!(matches!(err, CodeLinkError::UnknownClass(c) if c == "test.Number"));
    }

    #[test]
    fn test_save_and_load() {
        let registry = registry();
        let scene = sample(&registry);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");

        save(&scene, &path).unwrap();
        let loaded = load(&path, &registry).unwrap();
        assert_eq!(to_dict(&loaded).unwrap(), to_dict(&scene).unwrap());
    }

    #[test]
    fn test_shape_defaults_persist_as_null() {
        use crate::value::ShapeHandle;
        let value = Value::List(vec![Value::Shape(ShapeHandle::new(1u8)), Value::Number(1.0)]);
        assert_eq!(
            persistable(&value),
            Value::List(vec![Value::Null, Value::Number(1.0)])
        );
    }
}
