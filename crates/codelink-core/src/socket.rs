//! Node sockets and their data post-processing flags

use serde::{Deserialize, Serialize};

use crate::ragged;
use crate::types::{Direction, EdgeId, NodeId, SocketKind};
use crate::value::Value;

/// Reshaping applied to data crossing a socket
///
/// Flags run in declaration order: flatten, simplify, graft,
/// graft-topology, unwrap, wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SocketFlags {
    pub flatten: bool,
    pub simplify: bool,
    pub graft: bool,
    pub graft_topology: bool,
    pub unwrap: bool,
    pub wrap: bool,
}

impl SocketFlags {
    /// No reshaping
    pub fn none() -> Self {
        Self::default()
    }

    pub fn flatten() -> Self {
        Self {
            flatten: true,
            ..Self::default()
        }
    }

    pub fn graft() -> Self {
        Self {
            graft: true,
            ..Self::default()
        }
    }

    pub fn simplify() -> Self {
        Self {
            simplify: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reshape `value` according to the set flags
    pub fn apply(&self, value: &Value) -> Value {
        if self.is_empty() {
            return value.clone();
        }
        let mut value = value.clone();
        if self.flatten && value.is_list() {
            value = Value::List(ragged::flatten(&value));
        }
        if self.simplify {
            value = ragged::simplify(&value);
        }
        if self.graft {
            value = ragged::graft(&value);
        }
        if self.graft_topology {
            value = ragged::graft_topology(&value);
        }
        if self.unwrap {
            value = ragged::unwrap(&value);
        }
        if self.wrap {
            value = ragged::wrap(&value);
        }
        value
    }
}

/// Boundary proxy descriptor for composite nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketLink {
    /// On a socket inside a sub-graph: the composite socket it stands in for
    Parent { index: usize },
    /// On a composite node's socket: the sub-graph socket it forwards to
    Child { node: NodeId, index: usize },
}

/// An input or output pin
#[derive(Debug, Clone, PartialEq)]
pub struct Socket {
    pub name: String,
    direction: Direction,
    pub kind: SocketKind,
    /// Value read when the socket is unconnected
    pub default: Value,
    pub flags: SocketFlags,
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) link: Option<SocketLink>,
}

impl Socket {
    /// Create a socket whose default is the kind's zero value
    pub fn new(name: impl Into<String>, direction: Direction, kind: SocketKind) -> Self {
        Self {
            name: name.into(),
            direction,
            kind,
            default: kind.zero(),
            flags: SocketFlags::none(),
            edges: Vec::new(),
            link: None,
        }
    }

    pub fn input(name: impl Into<String>, kind: SocketKind) -> Self {
        Self::new(name, Direction::Input, kind)
    }

    pub fn output(name: impl Into<String>, kind: SocketKind) -> Self {
        Self::new(name, Direction::Output, kind)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_flags(mut self, flags: SocketFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_link(mut self, link: SocketLink) -> Self {
        self.link = Some(link);
        self
    }

    pub(crate) fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Fixed once the socket is attached to a node
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Incident edges, in connection order
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn is_connected(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn link(&self) -> Option<SocketLink> {
        self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_no_flags_is_identity() {
        let value = Value::List(vec![n(1.0), Value::List(vec![n(2.0)])]);
        assert_eq!(SocketFlags::none().apply(&value), value);
    }

    #[test]
    fn test_flatten_flag() {
        let value = Value::List(vec![n(1.0), Value::List(vec![n(2.0), n(3.0)])]);
        assert_eq!(
            SocketFlags::flatten().apply(&value),
            Value::List(vec![n(1.0), n(2.0), n(3.0)])
        );
        assert_eq!(SocketFlags::flatten().apply(&n(4.0)), n(4.0));
    }

    #[test]
    fn test_flags_run_in_order() {
        let flags = SocketFlags {
            flatten: true,
            graft: true,
            ..SocketFlags::default()
        };
        let value = Value::List(vec![Value::List(vec![n(1.0)]), n(2.0)]);
        assert_eq!(
            flags.apply(&value),
            Value::List(vec![Value::List(vec![n(1.0)]), Value::List(vec![n(2.0)])])
        );
    }

    #[test]
    fn test_wrap_then_unwrap_flags() {
        let value = Value::List(vec![n(1.0)]);
        let wrapped = SocketFlags {
            wrap: true,
            ..SocketFlags::default()
        }
        .apply(&value);
        assert_eq!(wrapped, Value::Wrapped(Box::new(value.clone())));

        let unwrapped = SocketFlags {
            unwrap: true,
            ..SocketFlags::default()
        }
        .apply(&wrapped);
        assert_eq!(unwrapped, value);
    }

    #[test]
    fn test_flags_serialize_pascal_case() {
        let json = serde_json::to_value(SocketFlags::graft()).unwrap();
        assert_eq!(json["Graft"], true);
        assert_eq!(json["GraftTopology"], false);
    }

    #[test]
    fn test_socket_defaults() {
        let socket = Socket::input("A", SocketKind::Scalar);
        assert_eq!(socket.direction(), Direction::Input);
        assert_eq!(socket.default, n(0.0));
        assert!(!socket.is_connected());
        assert!(socket.link().is_none());
    }
}
