//! Engine-to-caller event forwarding.
//!
//! The engine raises collaboration and view lifecycle events at its own
//! pace. A caller attaches an [`EventSink`]; while none is attached, or
//! after teardown detaches it, events are dropped rather than queued.

use bridge_types::BridgeEvent;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Receiver of forwarded engine events.
pub trait EventSink: Send + Sync {
    /// Handle one event. Must not block.
    fn on_event(&self, event: BridgeEvent);
}

/// Any unbounded sender can act as a sink; send failures mean the
/// receiving side went away and the event is dropped.
impl EventSink for mpsc::UnboundedSender<BridgeEvent> {
    fn on_event(&self, event: BridgeEvent) {
        if self.send(event).is_err() {
            tracing::debug!("event receiver dropped, discarding event");
        }
    }
}

/// Fan-in point between the engine's event callbacks and the caller's sink.
///
/// Clones share the attached sink.
#[derive(Clone, Default)]
pub struct EventForwarder {
    sink: Arc<RwLock<Option<Arc<dyn EventSink>>>>,
}

impl EventForwarder {
    /// Forwarder with no sink attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink, replacing any previous one.
    pub fn set_sink(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write().unwrap() = Some(sink);
    }

    /// Detach the sink. Subsequent events are dropped.
    pub fn clear_sink(&self) {
        *self.sink.write().unwrap() = None;
    }

    /// Forward one event to the attached sink, if any.
    pub fn forward(&self, event: BridgeEvent) {
        let sink = self.sink.read().unwrap().clone();
        match sink {
            Some(sink) => sink.on_event(event),
            None => tracing::trace!(event = event.name(), "no event sink attached, dropping"),
        }
    }
}

impl std::fmt::Debug for EventForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attached = self.sink.read().unwrap().is_some();
        f.debug_struct("EventForwarder")
            .field("sink_attached", &attached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::DocumentId;

    #[tokio::test]
    async fn events_reach_the_attached_sink() {
        let forwarder = EventForwarder::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        forwarder.set_sink(Arc::new(tx));

        forwarder.forward(BridgeEvent::InstantSyncStarted {
            document_id: DocumentId::new("doc-1"),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "instantSyncStarted");
    }

    #[tokio::test]
    async fn events_without_a_sink_are_dropped() {
        let forwarder = EventForwarder::new();
        // No sink attached; must not panic or queue.
        forwarder.forward(BridgeEvent::ViewWillDismiss);
    }

    #[tokio::test]
    async fn clearing_the_sink_stops_forwarding() {
        let forwarder = EventForwarder::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        forwarder.set_sink(Arc::new(tx));
        forwarder.clear_sink();

        forwarder.forward(BridgeEvent::ViewDidDismiss);

        // Sender clone inside the forwarder is gone, so the channel is closed.
        assert!(rx.recv().await.is_none());
    }
}
