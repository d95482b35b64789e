//! Error types for the CodeLink core

use thiserror::Error;

use crate::types::{Direction, EdgeId, FrameId, NodeId};

/// Result type alias using CodeLinkError
pub type Result<T> = std::result::Result<T, CodeLinkError>;

/// Errors raised by the document model, the scene and the engine
#[derive(Debug, Error)]
pub enum CodeLinkError {
    /// No node with this id in the scene
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// No edge with this id in the scene
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// No frame with this id in the scene
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),

    /// Socket index out of range on an existing node
    #[error("Socket not found: {direction:?} #{index} on node {node}")]
    SocketNotFound {
        node: NodeId,
        direction: Direction,
        index: usize,
    },

    /// Tree item handle or row that does not exist
    #[error("Tree item not found: {0}")]
    ItemNotFound(String),

    /// Property set on a key outside a schema-constrained model
    #[error("Invalid property key: {0}")]
    InvalidKey(String),

    /// An entity with this UUID is already registered
    #[error("Duplicate id: {0}")]
    DuplicateId(uuid::Uuid),

    /// Edge endpoints do not form an output -> input pair of compatible kinds
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// The input socket already has an incoming edge
    #[error("Input {index} on node {node} is already connected")]
    InputOccupied { node: NodeId, index: usize },

    /// Directed cycle among node-level edges
    #[error("Cycle detected in graph")]
    CycleDetected,

    /// Type tag not present in the registry
    #[error("Unknown node class: {0}")]
    UnknownClass(String),

    /// Operation rejected because of the scene's current shape
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Broadcasting two incompatible nested structures
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    /// Structure descriptor refers outside its flat data
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Node evaluation failed
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodeLinkError {
    /// Create an invalid operation error with a message
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

/// Two nested structures could not be broadcast against each other
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Shape mismatch at depth {depth}: lengths {left} and {right} do not broadcast")]
pub struct ShapeMismatch {
    /// Nesting level where the disagreement was found
    pub depth: usize,
    /// Length of the first conflicting list
    pub left: usize,
    /// Length of the second conflicting list
    pub right: usize,
}

/// Errors returned by a node's evaluation function
///
/// These never abort an evaluation sweep. The engine marks the node
/// `Invalid` and falls back to its last good value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Generic failure with a message
    #[error("{0}")]
    Failed(String),

    /// Inputs could not be broadcast together
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    /// An iteration cap was hit
    #[error("Gave up after {attempts} attempts")]
    ResourceExhausted { attempts: usize },

    /// A requested size is over the configured limit
    #[error("Requested {requested} items, limit is {limit}")]
    LimitExceeded { requested: usize, limit: usize },

    /// An input value has the wrong type
    #[error("Invalid input '{socket}': expected {expected}")]
    InvalidInput { socket: String, expected: String },

    /// The node class has no evaluation function
    #[error("No evaluator registered for class '{0}'")]
    NoEvaluator(String),

    /// The evaluation function panicked
    #[error("Evaluator panicked: {0}")]
    Panicked(String),

    /// A composite node's sub-graph could not be evaluated
    #[error("Sub-graph evaluation failed: {0}")]
    Subgraph(String),
}

impl EvaluationError {
    /// Create a failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(socket: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidInput {
            socket: socket.into(),
            expected: expected.into(),
        }
    }
}
