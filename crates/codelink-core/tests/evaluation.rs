//! Incremental evaluation across whole scenes

mod common;

use codelink_core::{
    validate_scene, CodeLinkError, EngineConfig, Evaluator, NodeState, Scene, SceneBuilder,
    Socket, SocketKind, SocketRef, Value, COMPOSITE_CLASS,
};
use common::{counting_registry, init_logging, ADD, DOUBLE, NUMBER};

#[test]
fn test_linear_chain_recomputes_only_the_edited_branch() {
    init_logging();
    let (registry, log) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("a", NUMBER)
        .with_property("Name", "A")
        .with_property("Value", 5.0)
        .add_node("b", NUMBER)
        .with_property("Name", "B")
        .with_property("Value", 3.0)
        .add_node("c", ADD)
        .with_property("Name", "C")
        .connect("a", "Value", "c", "A")
        .connect("b", "Value", "c", "B")
        .build()
        .unwrap();

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = built.output("c", "Result").unwrap();
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(8.0));
    assert_eq!((log.count("A"), log.count("B"), log.count("C")), (1, 1, 1));

    let a = built.id("a").unwrap();
    built.scene.set_property(a, "Value", 10.0).unwrap();
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(13.0));
    assert_eq!((log.count("A"), log.count("B"), log.count("C")), (2, 1, 2));

    // Nothing changed: served entirely from cache
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(13.0));
    assert_eq!(log.total(), 5);
}

#[test]
fn test_edit_marks_only_the_edited_node_dirty() {
    let (registry, log) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("a", NUMBER)
        .with_property("Name", "A")
        .with_property("Value", 1.0)
        .add_node("d1", DOUBLE)
        .with_property("Name", "D1")
        .add_node("d2", DOUBLE)
        .with_property("Name", "D2")
        .connect("a", "Value", "d1", "X")
        .connect("d1", "Result", "d2", "X")
        .add_node("other", NUMBER)
        .with_property("Name", "Other")
        .build()
        .unwrap();

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    engine.evaluate_ends(&mut built.scene).unwrap();
    for label in ["a", "d1", "d2", "other"] {
        let id = built.id(label).unwrap();
        assert_eq!(built.scene.node(id).unwrap().state(), NodeState::Clean);
    }

    let a = built.id("a").unwrap();
    built.scene.set_property(a, "Value", 4.0).unwrap();
    assert_eq!(built.scene.node(a).unwrap().state(), NodeState::Dirty);
    let d2 = built.id("d2").unwrap();
    assert_eq!(built.scene.node(d2).unwrap().state(), NodeState::Clean);

    let result = built.output("d2", "Result").unwrap();
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(16.0));
    assert_eq!(log.count("D1"), 2);
    assert_eq!(log.count("D2"), 2);
    assert_eq!(log.count("Other"), 1);
}

#[test]
fn test_versions_increase_along_recomputation() {
    let (registry, _) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("a", NUMBER)
        .add_node("d", DOUBLE)
        .connect("a", "Value", "d", "X")
        .build()
        .unwrap();

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = built.output("d", "Result").unwrap();
    engine.evaluate(&mut built.scene, result).unwrap();

    let a = built.id("a").unwrap();
    let d = built.id("d").unwrap();
    let before = built.scene.node(d).unwrap().version();
    assert!(built.scene.node(a).unwrap().version() > 0);

    built.scene.set_property(a, "Value", 2.0).unwrap();
    engine.evaluate(&mut built.scene, result).unwrap();
    assert!(built.scene.node(d).unwrap().version() > before);
}

#[test]
fn test_cycle_is_reported_not_evaluated() {
    init_logging();
    let (registry, log) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("x", ADD)
        .add_node("y", ADD)
        .connect("x", "Result", "y", "A")
        .connect("y", "Result", "x", "A")
        .build()
        .unwrap();

    assert!(built.scene.is_cyclic());
    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = built.output("y", "Result").unwrap();
    let err = engine.evaluate(&mut built.scene, result).unwrap_err();
    assert!(matches!(err, CodeLinkError::CycleDetected));
    assert_eq!(log.total(), 0);

    let errors = validate_scene(&built.scene, Some(&registry));
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_folding_keeps_values_and_topology() {
    init_logging();
    let (registry, log) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("a", NUMBER)
        .with_property("Value", 5.0)
        .add_node("b", DOUBLE)
        .with_property("Name", "B")
        .add_node("c", DOUBLE)
        .connect("a", "Value", "b", "X")
        .connect("b", "Result", "c", "X")
        .add_node("d", COMPOSITE_CLASS)
        .build()
        .unwrap();
    let [a, b, c, d] = ["a", "b", "c", "d"].map(|label| built.id(label).unwrap());

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = SocketRef::output(c, 0);
    let flat = engine.evaluate(&mut built.scene, result).unwrap();
    assert_eq!(flat, Value::Number(20.0));

    let report = built.scene.populate_sub_scene(d, &[b]).unwrap();
    assert_eq!(report.nodes, vec![b]);
    assert_eq!(built.scene.predecessors(d), vec![a]);
    assert_eq!(built.scene.predecessors(c), vec![d]);
    assert!(built.scene.node(b).is_none());
    assert!(built.scene.subgraph(d).unwrap().node(b).is_some());
    assert!(validate_scene(&built.scene, Some(&registry)).is_empty());

    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), flat);

    // An upstream edit reaches through the composite
    let calls = log.count("B");
    built.scene.set_property(a, "Value", 1.0).unwrap();
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(4.0));
    assert_eq!(log.count("B"), calls + 1);

    let moved = built.scene.resolve_sub_scene(d).unwrap();
    assert_eq!(moved, vec![b]);
    assert_eq!(built.scene.predecessors(c), vec![b]);
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(4.0));
}

#[test]
fn test_unconnected_inputs_use_defaults() {
    let (registry, _) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("sum", ADD)
        .with_default("A", 2.0)
        .with_default("B", Value::List(vec![Value::Number(1.0), Value::Number(2.0)]))
        .build()
        .unwrap();

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = built.output("sum", "Result").unwrap();
    assert_eq!(
        engine.evaluate(&mut built.scene, result).unwrap(),
        Value::List(vec![Value::Number(3.0), Value::Number(4.0)])
    );
}

#[test]
fn test_folding_into_composite_with_existing_output() {
    let (registry, _) = counting_registry();
    let mut built = SceneBuilder::new(&registry)
        .add_node("a", NUMBER)
        .with_property("Value", 5.0)
        .add_node("b", DOUBLE)
        .add_node("c", DOUBLE)
        .connect("a", "Value", "b", "X")
        .connect("b", "Result", "c", "X")
        .build()
        .unwrap();
    let [b, c] = ["b", "c"].map(|label| built.id(label).unwrap());
    let composite = registry
        .create(COMPOSITE_CLASS)
        .unwrap()
        .with_output(Socket::output("Extra", SocketKind::Scalar));
    let d = built.scene.add_node(composite).unwrap();

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = SocketRef::output(c, 0);
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(20.0));

    built.scene.populate_sub_scene(d, &[b]).unwrap();
    assert!(validate_scene(&built.scene, Some(&registry)).is_empty());
    assert_eq!(engine.evaluate(&mut built.scene, result).unwrap(), Value::Number(20.0));
    assert_eq!(built.scene.node(d).unwrap().state(), NodeState::Clean);
}

#[test]
fn test_deep_chain_evaluates_without_recursion() {
    const DEPTH: usize = 100_000;
    let (registry, log) = counting_registry();
    let mut scene = Scene::new();
    let source = scene.add_node(registry.create(NUMBER).unwrap()).unwrap();
    scene.set_property(source, "Value", 1.0).unwrap();

    let mut last = source;
    for _ in 0..DEPTH {
        let add = scene.add_node(registry.create(ADD).unwrap()).unwrap();
        scene
            .connect(SocketRef::output(last, 0), SocketRef::input(add, 0))
            .unwrap();
        last = add;
    }

    let mut engine = Evaluator::new(&registry, EngineConfig::default());
    let result = SocketRef::output(last, 0);
    assert_eq!(engine.evaluate(&mut scene, result).unwrap(), Value::Number(1.0));
    assert_eq!(log.total(), DEPTH + 1);

    scene.set_property(source, "Value", 2.0).unwrap();
    assert_eq!(engine.evaluate(&mut scene, result).unwrap(), Value::Number(2.0));
    assert_eq!(log.total(), 2 * (DEPTH + 1));
}
