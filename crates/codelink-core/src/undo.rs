//! Snapshot history for scenes
//!
//! Each entry is a zstd-compressed serialized scene. Restoring an entry
//! rebuilds the scene through the registry, so restored nodes start
//! `Dirty` with empty caches. Nothing in the scene knows about the
//! history; callers push after each edit they want to be undoable.
//!
//! Shape handles cannot be serialized, so socket defaults holding them are
//! kept beside the compressed bytes and put back after restoring.

use std::collections::VecDeque;

use crate::config::EngineConfig;
use crate::error::{CodeLinkError, Result};
use crate::registry::NodeRegistry;
use crate::scene::Scene;
use crate::serial;
use crate::types::{Direction, NodeId, SocketRef};
use crate::value::Value;

/// Socket default holding a shape handle, addressed from the root scene
#[derive(Debug, Clone)]
struct ShapeDefault {
    /// Composites to descend through
    path: Vec<NodeId>,
    socket: SocketRef,
    value: Value,
}

struct Snapshot {
    /// zstd-compressed scene dictionary
    data: Vec<u8>,
    shapes: Vec<ShapeDefault>,
}

/// Undo/redo stack using compressed scene snapshots
pub struct UndoStack {
    snapshots: VecDeque<Snapshot>,
    /// Position of the state the caller is looking at
    current: usize,
    /// Maximum number of snapshots to keep
    max_snapshots: usize,
    level: i32,
}

impl UndoStack {
    /// Keeps up to `undo_depth` undo steps
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: config.undo_depth.saturating_add(1),
            level: config.snapshot_compression_level,
        }
    }

    /// Record `scene` as the newest state
    ///
    /// Drops any redo history past the current position.
    pub fn push(&mut self, scene: &Scene) -> Result<()> {
        let json = serde_json::to_vec(&serial::to_dict(scene)?)?;
        let data = zstd::encode_all(&json[..], self.level)
            .map_err(|e| CodeLinkError::Compression(e.to_string()))?;
        let mut shapes = Vec::new();
        collect_shapes(scene, &mut Vec::new(), &mut shapes);

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(Snapshot { data, shapes });
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }
        log::debug!(
            "Snapshot {} recorded ({} bytes total)",
            self.current,
            self.compressed_size()
        );
        Ok(())
    }

    /// Step back one snapshot; `None` at the oldest one
    pub fn undo(&mut self, registry: &NodeRegistry) -> Option<Result<Scene>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(self.restore(self.current, registry))
    }

    /// Step forward one snapshot; `None` at the newest one
    pub fn redo(&mut self, registry: &NodeRegistry) -> Option<Result<Scene>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(self.restore(self.current, registry))
    }

    /// Rebuild the current snapshot without moving
    pub fn current(&self, registry: &NodeRegistry) -> Option<Result<Scene>> {
        if self.snapshots.is_empty() {
            None
        } else {
            Some(self.restore(self.current, registry))
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    /// Total compressed size of all snapshots
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.data.len()).sum()
    }

    fn restore(&self, index: usize, registry: &NodeRegistry) -> Result<Scene> {
        let snapshot = self
            .snapshots
            .get(index)
            .ok_or_else(|| CodeLinkError::invalid(format!("no snapshot at {}", index)))?;
        let json = zstd::decode_all(&snapshot.data[..])
            .map_err(|e| CodeLinkError::Compression(e.to_string()))?;
        let dict: serde_json::Value = serde_json::from_slice(&json)?;
        let mut scene = serial::from_dict(&dict, registry)?;

        for shape in &snapshot.shapes {
            let mut target = &mut scene;
            for id in &shape.path {
                target = target.subgraph_mut(*id)?;
            }
            target.set_socket_default(shape.socket, shape.value.clone())?;
        }
        Ok(scene)
    }
}

fn holds_shape(value: &Value) -> bool {
    match value {
        Value::Shape(_) => true,
        Value::List(items) => items.iter().any(holds_shape),
        Value::Wrapped(inner) => holds_shape(inner),
        _ => false,
    }
}

fn collect_shapes(scene: &Scene, path: &mut Vec<NodeId>, out: &mut Vec<ShapeDefault>) {
    for node in scene.nodes() {
        for direction in [Direction::Input, Direction::Output] {
            for (index, socket) in node.sockets(direction).iter().enumerate() {
                if holds_shape(&socket.default) {
                    out.push(ShapeDefault {
                        path: path.clone(),
                        socket: SocketRef {
                            node: node.id,
                            direction,
                            index,
                        },
                        value: socket.default.clone(),
                    });
                }
            }
        }
        if let Some(sub) = node.subgraph() {
            path.push(node.id);
            collect_shapes(sub, path, out);
            path.pop();
        }
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
