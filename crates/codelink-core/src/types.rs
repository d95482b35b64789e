//! Core types for the dataflow graph
//!
//! Identifiers, socket kinds, and the small entities (edges, frames)
//! that don't carry behaviour of their own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// Unique identifier for a node
pub type NodeId = Uuid;

/// Unique identifier for an edge
pub type EdgeId = Uuid;

/// Unique identifier for a frame
pub type FrameId = Uuid;

/// Which side of a node a socket sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// The kind of data a socket carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketKind {
    /// Accepts any value
    Any,
    /// Floating-point number
    Scalar,
    /// True/false
    Boolean,
    /// 3D vector
    Vector,
    /// Opaque geometry handle
    Shape,
}

impl SocketKind {
    /// Check if a value of this kind may flow into a socket of `other`
    pub fn is_compatible_with(&self, other: &SocketKind) -> bool {
        // Any type is compatible with everything
        if matches!(self, SocketKind::Any) || matches!(other, SocketKind::Any) {
            return true;
        }

        // Booleans coerce to 0/1 and back
        if matches!(
            (self, other),
            (SocketKind::Scalar, SocketKind::Boolean) | (SocketKind::Boolean, SocketKind::Scalar)
        ) {
            return true;
        }

        self == other
    }

    /// Value used when nothing better is available
    pub fn zero(&self) -> Value {
        match self {
            SocketKind::Any | SocketKind::Shape => Value::Null,
            SocketKind::Scalar => Value::Number(0.0),
            SocketKind::Boolean => Value::Bool(false),
            SocketKind::Vector => Value::Vector([0.0; 3]),
        }
    }

    /// Display color, inherited by edges leaving a socket of this kind
    pub fn color(&self) -> &'static str {
        match self {
            SocketKind::Any => "#9e9e9e",
            SocketKind::Scalar => "#4caf50",
            SocketKind::Boolean => "#e91e63",
            SocketKind::Vector => "#3f51b5",
            SocketKind::Shape => "#ff9800",
        }
    }
}

/// Address of one socket in a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: NodeId,
    pub direction: Direction,
    pub index: usize,
}

impl SocketRef {
    /// Input socket `index` of `node`
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: Direction::Input,
            index,
        }
    }

    /// Output socket `index` of `node`
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: Direction::Output,
            index,
        }
    }
}

/// Category of a node, used to group classes in menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Constant and parameter nodes
    Input,
    /// Arithmetic and numeric sequences
    Math,
    /// List inspection and indexing
    List,
    /// Vector construction and decomposition
    Vector,
    /// Point distribution
    Sampling,
    /// Nodes that own a sub-graph
    Composite,
}

/// Cache validity of a node's outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Outputs reflect the current inputs and properties
    Clean,
    /// Something changed since the last evaluation
    #[default]
    Dirty,
    /// The last evaluation attempt failed
    Invalid,
}

/// An edge from an output socket to an input socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Producing output socket
    pub start: SocketRef,
    /// Consuming input socket
    pub end: SocketRef,
    /// Derived from the start socket's kind
    pub color: String,
}

impl Edge {
    /// Create an edge with a fresh id
    pub fn new(start: SocketRef, end: SocketRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            color: SocketKind::Any.color().to_string(),
        }
    }
}

/// An organizational grouping of nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame
    pub id: FrameId,
    /// Title shown on the frame
    pub name: String,
    /// Member nodes
    pub members: BTreeSet<NodeId>,
}

impl Frame {
    /// Create an empty frame with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_compatibility() {
        assert!(SocketKind::Scalar.is_compatible_with(&SocketKind::Scalar));
        assert!(SocketKind::Scalar.is_compatible_with(&SocketKind::Boolean));
        assert!(SocketKind::Any.is_compatible_with(&SocketKind::Shape));
        assert!(SocketKind::Vector.is_compatible_with(&SocketKind::Any));
        assert!(!SocketKind::Vector.is_compatible_with(&SocketKind::Scalar));
        assert!(!SocketKind::Shape.is_compatible_with(&SocketKind::Boolean));
    }

    #[test]
    fn test_kind_zero() {
        assert_eq!(SocketKind::Scalar.zero(), Value::Number(0.0));
        assert_eq!(SocketKind::Vector.zero(), Value::Vector([0.0; 3]));
        assert_eq!(SocketKind::Shape.zero(), Value::Null);
    }

    #[test]
    fn test_socket_ref_constructors() {
        let node = Uuid::new_v4();
        assert_eq!(SocketRef::input(node, 1).direction, Direction::Input);
        assert_eq!(SocketRef::output(node, 0).direction, Direction::Output);
        assert_eq!(Direction::Input.opposite(), Direction::Output);
    }

    #[test]
    fn test_node_state_default_is_dirty() {
        assert_eq!(NodeState::default(), NodeState::Dirty);
    }
}
