//! Events published by the view for renderers and session collaborators.
//!
//! The core thread never blocks on a slow consumer: events go out with
//! `try_send` over a bounded crossbeam channel and are dropped (with a
//! warning) when the channel is full.

use crate::graph::NodeId;
use crate::types::GraphItem;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Channel capacity for view events.
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Something observable changed in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node switched to expanded.
    NodeExpanded(NodeId),
    /// A node switched to collapsed.
    NodeCollapsed(NodeId),
    /// A node's own geometry (size, children, pipe routes) was recomputed.
    LayoutChanged(NodeId),
    /// The status of a node or pipe changed.
    StatusChanged(GraphItem),
    /// The single selected item changed (`None` when cleared).
    SelectionChanged(Option<GraphItem>),
}

/// Core-side handle.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<GraphEvent>,
}

/// Consumer-side handle.
#[derive(Debug, Clone)]
pub struct EventReceiver {
    rx: Receiver<GraphEvent>,
}

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    (EventSender { tx }, EventReceiver { rx })
}

impl EventSender {
    pub fn emit(&self, event: GraphEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!("Event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl EventReceiver {
    /// Drain all pending events.
    pub fn drain(&self) -> Vec<GraphEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Try to receive a single event without blocking.
    pub fn try_recv(&self) -> Option<GraphEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let (tx, rx) = event_channel();
        tx.emit(GraphEvent::NodeExpanded(NodeId(1)));
        tx.emit(GraphEvent::LayoutChanged(NodeId(1)));
        assert_eq!(
            rx.drain(),
            vec![
                GraphEvent::NodeExpanded(NodeId(1)),
                GraphEvent::LayoutChanged(NodeId(1))
            ]
        );
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.emit(GraphEvent::SelectionChanged(None));
    }
}
