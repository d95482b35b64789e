//! Change notifications for the document model and the scene
//!
//! Events are sent from the core to whatever presents it (a node editor,
//! a test harness) to report structural edits, property changes and
//! evaluation outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait for receiving model events
///
/// This abstracts over the transport mechanism (UI binding, channel, log)
/// so the core can be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered
    fn send(&self, event: ModelEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted while editing or evaluating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelEvent {
    /// Rows `first..=last` were inserted under `parent`
    #[serde(rename_all = "camelCase")]
    RowsInserted { parent: Uuid, first: usize, last: usize },

    /// Rows are about to be removed; the subtree is still reachable
    #[serde(rename_all = "camelCase")]
    RowsAboutToBeRemoved { parent: Uuid, first: usize, last: usize },

    /// Rows were removed
    #[serde(rename_all = "camelCase")]
    RowsRemoved { parent: Uuid, first: usize, last: usize },

    /// A node property changed value
    #[serde(rename_all = "camelCase")]
    PropertyChanged { node: Uuid, key: String },

    /// A node was added to a scene
    #[serde(rename_all = "camelCase")]
    NodeAdded { node: Uuid, class: String },

    /// A node was removed from a scene
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node: Uuid },

    /// An edge was added
    #[serde(rename_all = "camelCase")]
    EdgeAdded { edge: Uuid, source: Uuid, target: Uuid },

    /// An edge was removed
    #[serde(rename_all = "camelCase")]
    EdgeRemoved { edge: Uuid },

    /// A frame was added
    #[serde(rename_all = "camelCase")]
    FrameAdded { frame: Uuid },

    /// A frame was removed
    #[serde(rename_all = "camelCase")]
    FrameRemoved { frame: Uuid },

    /// A node's cached outputs are stale
    #[serde(rename_all = "camelCase")]
    NodeDirty { node: Uuid },

    /// A node output was recomputed successfully
    #[serde(rename_all = "camelCase")]
    NodeEvaluated { node: Uuid, output: usize },

    /// A node's evaluation function failed
    #[serde(rename_all = "camelCase")]
    NodeFailed { node: Uuid, error: String },

    /// Nodes were folded into a composite node's sub-graph
    #[serde(rename_all = "camelCase")]
    SubSceneFolded { composite: Uuid, nodes: Vec<Uuid> },

    /// A composite node's sub-graph was expanded back into its scene
    #[serde(rename_all = "camelCase")]
    SubSceneResolved { composite: Uuid, nodes: Vec<Uuid> },
}

impl ModelEvent {
    /// The entity the event is about
    pub fn subject(&self) -> Uuid {
        match self {
            Self::RowsInserted { parent, .. }
            | Self::RowsAboutToBeRemoved { parent, .. }
            | Self::RowsRemoved { parent, .. } => *parent,
            Self::PropertyChanged { node, .. }
            | Self::NodeAdded { node, .. }
            | Self::NodeRemoved { node }
            | Self::NodeDirty { node }
            | Self::NodeEvaluated { node, .. }
            | Self::NodeFailed { node, .. } => *node,
            Self::EdgeAdded { edge, .. } | Self::EdgeRemoved { edge } => *edge,
            Self::FrameAdded { frame } | Self::FrameRemoved { frame } => *frame,
            Self::SubSceneFolded { composite, .. } | Self::SubSceneResolved { composite, .. } => {
                *composite
            }
        }
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: ModelEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<ModelEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<ModelEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: ModelEvent) -> Result<(), EventError> {
        let mut events = self.events.lock().map_err(|_| EventError {
            message: "event log poisoned".to_string(),
        })?;
        events.push(event);
        Ok(())
    }
}

/// Deliver an event, logging instead of failing when the sink refuses it
pub(crate) fn emit(sink: &dyn EventSink, event: ModelEvent) {
    if let Err(e) = sink.send(event) {
        log::debug!("dropped model event: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        let node = Uuid::new_v4();

        sink.send(ModelEvent::NodeDirty { node }).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ModelEvent::NodeDirty { node: id } => assert_eq!(*id, node),
            _ => panic!("Expected NodeDirty event"),
        }
        assert_eq!(events[0].subject(), node);

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        // Should not panic
        sink.send(ModelEvent::NodeRemoved { node: Uuid::new_v4() })
            .unwrap();
    }

    struct RefusingSink;

    impl EventSink for RefusingSink {
        fn send(&self, _event: ModelEvent) -> Result<(), EventError> {
            Err(EventError {
                message: "refused".to_string(),
            })
        }
    }

    #[test]
    fn test_refused_event_is_dropped() {
        let sink = RefusingSink;
        let err = sink.send(ModelEvent::NodeDirty { node: Uuid::nil() }).unwrap_err();
        assert_eq!(err.to_string(), "Event error: refused");
        // Emitting through a refusing sink only logs
        emit(&sink, ModelEvent::NodeDirty { node: Uuid::nil() });
    }

    #[test]
    fn test_event_serialization() {
        let event = ModelEvent::PropertyChanged {
            node: Uuid::nil(),
            key: "Value".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "propertyChanged");
        assert_eq!(json["key"], "Value");
    }
}
