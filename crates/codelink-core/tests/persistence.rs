//! Saving, loading and snapshot history of whole scenes

mod common;

use std::collections::BTreeSet;

use codelink_core::{
    serial, validate_scene, EngineConfig, Evaluator, Frame, NodeId, NodeRegistry, Scene,
    SocketFlags, SocketRef, UndoStack, Value, COMPOSITE_CLASS,
};
use common::{counting_registry, ADD, DOUBLE, NUMBER};
use proptest::prelude::*;

/// One node of a generated scene: a number, or an adder fed by earlier nodes
#[derive(Debug, Clone)]
enum Spec {
    Number(i32),
    Add {
        a: Option<usize>,
        b: Option<usize>,
        graft: bool,
    },
}

/// A generated scene: nodes, an optional fold of a contiguous run into a
/// composite, and a frame over some of the nodes
#[derive(Debug, Clone)]
struct Layout {
    nodes: Vec<Spec>,
    fold: Option<(usize, usize)>,
    frame: Vec<usize>,
}

fn node_specs() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        prop_oneof![
            (-50i32..50).prop_map(Spec::Number),
            (any::<Option<usize>>(), any::<Option<usize>>(), any::<bool>())
                .prop_map(|(a, b, graft)| Spec::Add { a, b, graft }),
        ],
        1..8,
    )
}

fn layouts() -> impl Strategy<Value = Layout> {
    (
        node_specs(),
        any::<Option<(usize, usize)>>(),
        prop::collection::vec(any::<usize>(), 0..4),
    )
        .prop_map(|(nodes, fold, frame)| Layout { nodes, fold, frame })
}

fn build(registry: &NodeRegistry, layout: &Layout) -> Scene {
    let mut scene = Scene::new();
    let mut ids: Vec<NodeId> = Vec::new();
    for spec in &layout.nodes {
        let id = match spec {
            Spec::Number(value) => {
                let id = scene.add_node(registry.create(NUMBER).unwrap()).unwrap();
                scene.set_property(id, "Value", *value as f64).unwrap();
                id
            }
            Spec::Add { a, b, graft } => {
                let id = scene.add_node(registry.create(ADD).unwrap()).unwrap();
                for (index, source) in [a, b].into_iter().enumerate() {
                    if let (Some(pick), false) = (source, ids.is_empty()) {
                        let start = SocketRef::output(ids[pick % ids.len()], 0);
                        scene.connect(start, SocketRef::input(id, index)).unwrap();
                    }
                }
                if *graft {
                    let flags = SocketFlags {
                        graft: true,
                        ..SocketFlags::none()
                    };
                    scene.set_socket_flags(SocketRef::output(id, 0), flags).unwrap();
                }
                id
            }
        };
        ids.push(id);
    }

    if !layout.frame.is_empty() {
        let mut frame = Frame::new("Group");
        frame.members = layout.frame.iter().map(|i| ids[i % ids.len()]).collect();
        scene.add_frame(frame).unwrap();
    }

    // Edges only run from earlier to later nodes, so a contiguous run is
    // always foldable without creating a cycle
    if let Some((lo, len)) = layout.fold {
        let lo = lo % ids.len();
        let hi = (lo + 1 + len % ids.len()).min(ids.len());
        let composite = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
        scene.populate_sub_scene(composite, &ids[lo..hi]).unwrap();
    }
    scene
}

fn sorted(mut results: Vec<(NodeId, Vec<Value>)>) -> Vec<(NodeId, Vec<Value>)> {
    results.sort_by_key(|(id, _)| *id);
    results
}

proptest! {
    #[test]
    fn prop_dict_round_trip_is_stable(layout in layouts()) {
        let (registry, _) = counting_registry();
        let scene = build(&registry, &layout);

        let first = serial::to_dict(&scene).unwrap();
        let restored = serial::from_dict(&first, &registry).unwrap();
        let second = serial::to_dict(&restored).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(restored.node_count(), scene.node_count());
        prop_assert_eq!(restored.edge_count(), scene.edge_count());
        prop_assert!(validate_scene(&restored, Some(&registry)).is_empty());

        for node in scene.nodes() {
            let other = restored.node(node.id).unwrap();
            prop_assert_eq!(other.pin_map(), node.pin_map());
            for (left, right) in node.outputs().iter().zip(other.outputs()) {
                prop_assert_eq!(left.flags, right.flags);
            }
        }
        let frames: BTreeSet<_> = scene.frames().map(|f| (f.id, f.members.clone())).collect();
        let restored_frames: BTreeSet<_> =
            restored.frames().map(|f| (f.id, f.members.clone())).collect();
        prop_assert_eq!(frames, restored_frames);
    }

    #[test]
    fn prop_restored_scene_evaluates_the_same(layout in layouts()) {
        let (registry, _) = counting_registry();
        let mut scene = build(&registry, &layout);
        let text = serial::to_string(&scene).unwrap();
        let mut restored = serial::from_str(&text, &registry).unwrap();

        let mut engine = Evaluator::new(&registry, EngineConfig::default());
        let expected = sorted(engine.evaluate_ends(&mut scene).unwrap());
        let actual = sorted(engine.evaluate_ends(&mut restored).unwrap());
        prop_assert_eq!(actual, expected);
    }
}

fn folded_scene(registry: &NodeRegistry) -> (Scene, [NodeId; 4]) {
    let mut scene = Scene::new();
    let a = scene.add_node(registry.create(NUMBER).unwrap()).unwrap();
    let b = scene.add_node(registry.create(DOUBLE).unwrap()).unwrap();
    let c = scene.add_node(registry.create(DOUBLE).unwrap()).unwrap();
    let d = scene.add_node(registry.create(COMPOSITE_CLASS).unwrap()).unwrap();
    scene.set_property(a, "Value", 3.0).unwrap();
    scene.connect(SocketRef::output(a, 0), SocketRef::input(b, 0)).unwrap();
    scene.connect(SocketRef::output(b, 0), SocketRef::input(c, 0)).unwrap();
    scene.populate_sub_scene(d, &[b]).unwrap();
    (scene, [a, b, c, d])
}

#[test]
fn test_save_and_load_file() {
    let (registry, _) = counting_registry();
    let (scene, [_, b, c, d]) = folded_scene(&registry);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    serial::save(&scene, &path).unwrap();
    let mut loaded = serial::load(&path, &registry).unwrap();

    assert!(loaded.subgraph(d).unwrap().node(b).is_some());
    assert_eq!(loaded.node(d).unwrap().pin_map(), scene.node(d).unwrap().pin_map());

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let value = engine.evaluate(&mut loaded, SocketRef::output(c, 0)).unwrap();
    assert_eq!(value, Value::Number(12.0));
}

#[test]
fn test_load_missing_file_fails() {
    let (registry, _) = counting_registry();
    let dir = tempfile::tempdir().unwrap();
    assert!(serial::load(dir.path().join("missing.json"), &registry).is_err());
}

#[test]
fn test_undo_across_fold_and_resolve() {
    let (registry, _) = counting_registry();
    let (mut scene, [_, b, c, d]) = folded_scene(&registry);
    let mut history = UndoStack::new(&EngineConfig::default());
    history.push(&scene).unwrap();

    scene.resolve_sub_scene(d).unwrap();
    history.push(&scene).unwrap();
    assert!(scene.node(b).is_some());

    let mut previous = history.undo(&registry).unwrap().unwrap();
    assert!(previous.node(b).is_none());
    assert!(previous.subgraph(d).unwrap().node(b).is_some());

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let value = engine.evaluate(&mut previous, SocketRef::output(c, 0)).unwrap();
    assert_eq!(value, Value::Number(12.0));

    let next = history.redo(&registry).unwrap().unwrap();
    assert!(next.node(b).is_some());
    assert!(history.redo(&registry).is_none());
}
