//! Demand-driven incremental evaluation
//!
//! Evaluation is pull-based: a request for one socket walks dependencies
//! backward, and only the nodes on that path are considered. Each node
//! remembers the sum of its upstream versions from the last time it ran;
//! a node recomputes when it was edited (not `Clean`) or when that sum has
//! moved. A node that recomputes takes a fresh version from the scene's
//! counter, which is how downstream nodes learn about it.
//!
//! # Key Concepts
//!
//! - **Planning**: iterative depth-first walk over predecessors; a node
//!   met again while still on the walk means a cycle
//! - **Per-output caching**: only the outputs someone consumes are
//!   computed, each in its own cache slot
//! - **Failure isolation**: a failing node becomes `Invalid` and serves its
//!   last good value (or the kind's zero); the sweep carries on
//! - **Composites**: the sub-graph is pulled with the composite's input
//!   values standing in for its boundary sockets

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::EngineConfig;
use crate::descriptor::EvalContext;
use crate::error::{CodeLinkError, EvaluationError, Result};
use crate::events::ModelEvent;
use crate::node::{CacheSlot, Node};
use crate::registry::NodeRegistry;
use crate::scene::Scene;
use crate::socket::SocketLink;
use crate::types::{Direction, NodeId, NodeState, SocketRef};
use crate::value::Value;

type Outcome = (usize, std::result::Result<Value, EvaluationError>);

/// Counters accumulated across evaluations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Evaluation function calls (composite outputs included)
    pub computed: usize,
    /// Requested outputs served from cache
    pub cache_hits: usize,
    /// Node evaluations that ended `Invalid`
    pub failures: usize,
}

/// Nodes to visit in dependency order, with the outputs each must supply
#[derive(Debug, Default)]
struct Plan {
    order: Vec<NodeId>,
    needed: HashMap<NodeId, BTreeSet<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Incremental evaluator bound to a registry
pub struct Evaluator<'r> {
    registry: &'r NodeRegistry,
    config: EngineConfig,
    stats: EvalStats,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r NodeRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            stats: EvalStats::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EvalStats::default();
    }

    /// Value of one socket, bringing everything it depends on up to date
    ///
    /// Output sockets return the cached slot value. Input sockets return
    /// what the node would receive: the upstream output, or the socket
    /// default, with input flags applied.
    pub fn evaluate(&mut self, scene: &mut Scene, socket: SocketRef) -> Result<Value> {
        scene.socket_checked(socket)?;
        match socket.direction {
            Direction::Output => {
                self.pull(scene, &[(socket.node, vec![socket.index])], &[])?;
                let node = scene.node_checked(socket.node)?;
                Ok(output_value(node, socket.index))
            }
            Direction::Input => {
                let upstream = scene.incoming_edge(socket).map(|edge| edge.start);
                if let Some(start) = upstream {
                    self.pull(scene, &[(start.node, vec![start.index])], &[])?;
                }
                let node = scene.node_checked(socket.node)?;
                let (mut inputs, _) = gather_inputs(scene, node, &[])?;
                Ok(inputs.swap_remove(socket.index))
            }
        }
    }

    /// Every output of `node`
    pub fn evaluate_node(&mut self, scene: &mut Scene, node: NodeId) -> Result<Vec<Value>> {
        let outputs: Vec<usize> = (0..scene.node_checked(node)?.outputs().len()).collect();
        self.pull(scene, &[(node, outputs)], &[])?;
        let node = scene.node_checked(node)?;
        Ok(outputs_of(node))
    }

    /// Sweep from every node without outgoing edges
    pub fn evaluate_ends(&mut self, scene: &mut Scene) -> Result<Vec<(NodeId, Vec<Value>)>> {
        let roots = scene
            .ends()
            .into_iter()
            .map(|id| {
                let count = scene.node(id).map_or(0, |n| n.outputs().len());
                (id, (0..count).collect())
            })
            .collect::<Vec<(NodeId, Vec<usize>)>>();
        self.pull(scene, &roots, &[])?;

        roots
            .iter()
            .map(|(id, _)| Ok((*id, outputs_of(scene.node_checked(*id)?))))
            .collect()
    }

    /// Bring the requested outputs up to date
    ///
    /// `boundary` holds the enclosing composite's input values when `scene`
    /// is a sub-graph. Only structural problems (missing nodes, cycles) are
    /// errors here; node failures are recorded on the nodes.
    fn pull(
        &mut self,
        scene: &mut Scene,
        roots: &[(NodeId, Vec<usize>)],
        boundary: &[Value],
    ) -> Result<()> {
        let plan = plan(scene, roots)?;
        log::debug!("Pulling {} nodes", plan.order.len());

        let empty = BTreeSet::new();
        for id in &plan.order {
            let needed = plan.needed.get(id).unwrap_or(&empty);
            self.run_node(scene, *id, needed, boundary)?;
        }
        Ok(())
    }

    fn run_node(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        needed: &BTreeSet<usize>,
        boundary: &[Value],
    ) -> Result<()> {
        let node = scene.node_checked(id)?;
        let (inputs, stamp) = gather_inputs(scene, node, boundary)?;
        let stale = node.state != NodeState::Clean || node.input_stamp != stamp;
        let composite = node.is_composite();

        let node = scene.node_checked_mut(id)?;
        if stale {
            for slot in &mut node.slots {
                slot.valid = false;
            }
        }
        let pending: Vec<usize> = needed
            .iter()
            .copied()
            .filter(|i| node.slots.get(*i).is_some_and(|slot| !slot.valid))
            .collect();
        self.stats.cache_hits += needed.len().saturating_sub(pending.len());

        if pending.is_empty() {
            if stale {
                node.input_stamp = stamp;
                node.state = NodeState::Clean;
            }
            return Ok(());
        }

        let outcomes = if composite {
            self.compute_composite(scene, id, stale, &pending, &inputs)?
        } else {
            self.compute_regular(scene, id, &pending, &inputs)?
        };
        self.stats.computed += outcomes.len();
        self.store(scene, id, stale, stamp, outcomes)
    }

    fn compute_regular(
        &self,
        scene: &Scene,
        id: NodeId,
        pending: &[usize],
        inputs: &[Value],
    ) -> Result<Vec<Outcome>> {
        let node = scene.node_checked(id)?;
        let Some(evaluator) = self.registry.evaluator(&node.class) else {
            let error = EvaluationError::NoEvaluator(node.class.clone());
            return Ok(pending.iter().map(|i| (*i, Err(error.clone()))).collect());
        };

        Ok(pending
            .iter()
            .map(|&output| {
                let ctx = EvalContext {
                    node: id,
                    class: &node.class,
                    properties: node.properties(),
                    output,
                    config: &self.config,
                };
                let result = if self.config.catch_panics {
                    catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(&ctx, inputs)))
                        .unwrap_or_else(|payload| {
                            Err(EvaluationError::Panicked(panic_message(payload)))
                        })
                } else {
                    evaluator.evaluate(&ctx, inputs)
                };
                (output, result)
            })
            .collect())
    }

    fn compute_composite(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        stale: bool,
        pending: &[usize],
        inputs: &[Value],
    ) -> Result<Vec<Outcome>> {
        let node = scene.node_checked_mut(id)?;
        let targets: Vec<Option<SocketRef>> = pending
            .iter()
            .map(|i| node.pin_map.get(Direction::Output, *i))
            .collect();
        let Some(mut sub) = node.subgraph.take() else {
            let error = EvaluationError::Subgraph(format!("node {} has no sub-graph", id));
            return Ok(pending.iter().map(|i| (*i, Err(error.clone()))).collect());
        };

        let roots: Vec<(NodeId, Vec<usize>)> = targets
            .iter()
            .flatten()
            .filter(|t| t.direction == Direction::Output)
            .map(|t| (t.node, vec![t.index]))
            .collect();
        let pulled = self.refresh_subgraph(&mut sub, stale, &roots, inputs);

        let outcomes = pending
            .iter()
            .zip(&targets)
            .map(|(&index, target)| {
                let result = match (&pulled, target) {
                    (Err(e), _) => Err(EvaluationError::Subgraph(e.to_string())),
                    (Ok(()), None) => Err(EvaluationError::Subgraph(format!(
                        "output {} is not mapped into the sub-graph",
                        index
                    ))),
                    (Ok(()), Some(target)) => match sub.node(target.node) {
                        Some(inner) if inner.state == NodeState::Invalid => {
                            Err(EvaluationError::Subgraph(format!(
                                "inner node '{}' failed",
                                inner.name()
                            )))
                        }
                        Some(inner) => Ok(output_value(inner, target.index)),
                        None => Err(EvaluationError::Subgraph(format!(
                            "inner node {} is missing",
                            target.node
                        ))),
                    },
                };
                (index, result)
            })
            .collect();

        if let Some(node) = scene.node_mut(id) {
            node.subgraph = Some(sub);
        }
        Ok(outcomes)
    }

    fn refresh_subgraph(
        &mut self,
        sub: &mut Scene,
        stale: bool,
        roots: &[(NodeId, Vec<usize>)],
        boundary: &[Value],
    ) -> Result<()> {
        if stale {
            let fed: Vec<NodeId> = sub
                .nodes()
                .filter(|n| {
                    n.inputs().iter().any(|s| {
                        !s.is_connected() && matches!(s.link(), Some(SocketLink::Parent { .. }))
                    })
                })
                .map(|n| n.id)
                .collect();
            for inner in fed {
                sub.mark_dirty(inner)?;
            }
        }
        self.pull(sub, roots, boundary)
    }

    fn store(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        stale: bool,
        stamp: u64,
        outcomes: Vec<Outcome>,
    ) -> Result<()> {
        let version = if stale && outcomes.iter().any(|(_, r)| r.is_ok()) {
            Some(scene.next_version())
        } else {
            None
        };

        let mut events = Vec::new();
        let mut failure = None;
        let node = scene.node_checked_mut(id)?;
        for (index, result) in outcomes {
            let (Some(socket), Some(slot)) = (node.outputs.get(index), node.slots.get_mut(index))
            else {
                continue;
            };
            match result {
                Ok(value) => {
                    *slot = CacheSlot {
                        value: Some(socket.flags.apply(&value)),
                        valid: true,
                    };
                    events.push(ModelEvent::NodeEvaluated {
                        node: id,
                        output: index,
                    });
                }
                Err(error) => {
                    slot.valid = false;
                    if failure.is_none() {
                        failure = Some(error);
                    }
                }
            }
        }

        if let Some(version) = version {
            node.version = version;
        }
        node.input_stamp = stamp;
        match failure {
            None => node.state = NodeState::Clean,
            Some(error) => {
                node.state = NodeState::Invalid;
                log::warn!("Evaluation of {} ({}) failed: {}", id, node.class, error);
                self.stats.failures += 1;
                events.push(ModelEvent::NodeFailed {
                    node: id,
                    error: error.to_string(),
                });
            }
        }

        for event in events {
            scene.emit(event);
        }
        Ok(())
    }
}

/// Depth-first walk over predecessors with an explicit stack
fn plan(scene: &Scene, roots: &[(NodeId, Vec<usize>)]) -> Result<Plan> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut plan = Plan::default();
    let mut stack: Vec<(NodeId, bool)> = Vec::new();

    for (id, outputs) in roots.iter().rev() {
        scene.node_checked(*id)?;
        plan.needed
            .entry(*id)
            .or_default()
            .extend(outputs.iter().copied());
        stack.push((*id, false));
    }

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            marks.insert(id, Mark::Done);
            plan.order.push(id);
            continue;
        }
        match marks.get(&id) {
            Some(Mark::Done) => continue,
            Some(Mark::Active) => {
                log::warn!("Cycle detected through node {}", id);
                return Err(CodeLinkError::CycleDetected);
            }
            None => {}
        }
        marks.insert(id, Mark::Active);
        stack.push((id, true));
        for pred in scene.predecessors(id).into_iter().rev() {
            stack.push((pred, false));
        }
    }

    for id in &plan.order {
        let Some(node) = scene.node(*id) else {
            continue;
        };
        for edge in node
            .inputs()
            .iter()
            .flat_map(|s| s.edges().iter())
            .filter_map(|e| scene.edge(*e))
        {
            plan.needed
                .entry(edge.start.node)
                .or_default()
                .insert(edge.start.index);
        }
    }
    Ok(plan)
}

/// Input values as the node sees them, and the sum of upstream versions
fn gather_inputs(scene: &Scene, node: &Node, boundary: &[Value]) -> Result<(Vec<Value>, u64)> {
    let mut stamp = 0u64;
    let mut values = Vec::with_capacity(node.inputs().len());
    for socket in node.inputs() {
        let raw = match socket.edges().first() {
            Some(edge_id) => {
                let edge = scene
                    .edge(*edge_id)
                    .ok_or(CodeLinkError::EdgeNotFound(*edge_id))?;
                let source = scene.node_checked(edge.start.node)?;
                stamp = stamp.wrapping_add(source.version);
                output_value(source, edge.start.index)
            }
            None => match socket.link() {
                Some(SocketLink::Parent { index }) if index < boundary.len() => {
                    boundary[index].clone()
                }
                _ => socket.default.clone(),
            },
        };
        values.push(socket.flags.apply(&raw));
    }
    Ok((values, stamp))
}

/// Cached value of an output, or the output kind's zero
fn output_value(node: &Node, index: usize) -> Value {
    node.cached(index)
        .cloned()
        .or_else(|| node.outputs().get(index).map(|s| s.kind.zero()))
        .unwrap_or_default()
}

fn outputs_of(node: &Node) -> Vec<Value> {
    (0..node.outputs().len())
        .map(|i| output_value(node, i))
        .collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
