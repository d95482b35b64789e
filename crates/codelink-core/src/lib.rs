//! CodeLink Core - graph data model and incremental dataflow evaluation
//!
//! This crate provides the model layer of a node-based visual programming
//! editor. It supports:
//!
//! - A generic arena tree with row-level change notifications
//! - Schema-constrained property models
//! - A DAG scene of nodes, typed sockets, edges and frames
//! - Composite nodes: folding a selection into a sub-graph and back
//! - Demand-driven evaluation with per-output caching and version stamps
//! - Ragged nested-list utilities with broadcasting
//! - JSON persistence and compressed snapshot-based undo/redo
//!
//! # Architecture
//!
//! - `Scene`: owns entities in slot-map arenas, keyed by stable UUIDs
//! - `NodeRegistry`: maps class tags to descriptors and evaluators
//! - `Evaluator`: pulls values through a scene, recomputing only stale nodes
//! - `EventSink`: change notifications for views (not tied to any toolkit)
//!
//! # Example
//!
//! ```ignore
//! use codelink_core::{EngineConfig, Evaluator, NodeRegistry, SceneBuilder};
//!
//! let registry = NodeRegistry::with_builtins();
//! let mut built = SceneBuilder::new(&registry)
//!     .add_node("a", "codelink.input.Number")
//!     .with_property("Value", 5.0)
//!     .add_node("sum", "codelink.math.Add")
//!     .with_default("B", 3.0)
//!     .connect("a", "Value", "sum", "A")
//!     .build()?;
//!
//! let mut engine = Evaluator::new(&registry, EngineConfig::default());
//! let value = engine.evaluate(&mut built.scene, built.output("sum", "Result")?)?;
//! ```

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod events;
pub mod node;
pub mod property;
pub mod ragged;
pub mod registry;
pub mod scene;
pub mod serial;
pub mod socket;
pub mod subscene;
pub mod tree;
pub mod types;
pub mod undo;
pub mod validation;
pub mod value;

// Re-export key types
pub use builder::{BuiltScene, SceneBuilder};
pub use config::EngineConfig;
pub use descriptor::{
    CallbackEvaluator, EvalContext, NodeDefinition, NodeDescriptor, NodeEvaluator, SocketSpec,
};
pub use engine::{EvalStats, Evaluator};
pub use error::{CodeLinkError, EvaluationError, Result, ShapeMismatch};
pub use events::{EventError, EventSink, ModelEvent, NullEventSink, VecEventSink};
pub use node::{CacheSlot, Node, PinMap};
pub use property::{PropertyModel, PropertyValue};
pub use ragged::{NestedData, Structure};
pub use registry::{NodeRegistration, NodeRegistry, RegistrationFn, COMPOSITE_CLASS};
pub use scene::{DagItem, OutlineItem, Scene};
pub use socket::{Socket, SocketFlags, SocketLink};
pub use subscene::{BoundaryEdges, FoldReport};
pub use tree::{ItemKey, Tree, TreeData};
pub use types::{
    Direction, Edge, EdgeId, Frame, FrameId, NodeCategory, NodeId, NodeState, SocketKind,
    SocketRef,
};
pub use undo::UndoStack;
pub use validation::{validate_scene, ValidationError};
pub use value::{ShapeHandle, Value};
