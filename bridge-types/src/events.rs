//! Outbound lifecycle notifications.
//!
//! The collaboration client and the presentation host each report a small
//! fixed set of asynchronous events. The bridge forwards them verbatim;
//! no buffering, no replay.

use crate::ids::DocumentId;
use serde::{Deserialize, Serialize};

/// A lifecycle event forwarded from the engine or the presentation host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// Remote document finished downloading.
    InstantDownloadFinished {
        /// The remote document.
        document_id: DocumentId,
    },
    /// Remote document download failed.
    InstantDownloadFailed {
        /// The remote document.
        document_id: DocumentId,
        /// Failure description from the collaboration client.
        error: String,
    },
    /// Authentication (or reauthentication) succeeded.
    InstantAuthenticationFinished {
        /// The remote document.
        document_id: DocumentId,
        /// The valid token issued by the server.
        jwt: String,
    },
    /// Authentication failed.
    InstantAuthenticationFailed {
        /// The remote document.
        document_id: DocumentId,
        /// Failure description from the collaboration client.
        error: String,
    },
    /// A sync cycle started.
    InstantSyncStarted {
        /// The remote document.
        document_id: DocumentId,
    },
    /// A sync cycle finished.
    InstantSyncFinished {
        /// The remote document.
        document_id: DocumentId,
    },
    /// A sync cycle failed.
    InstantSyncFailed {
        /// The remote document.
        document_id: DocumentId,
        /// Failure description from the collaboration client.
        error: String,
    },
    /// The engine finished loading a document into the view.
    DocumentLoaded {
        /// The loaded document.
        document_id: DocumentId,
    },
    /// The presentation host is about to close the view.
    ViewWillDismiss,
    /// The presentation host closed the view.
    ViewDidDismiss,
}

impl BridgeEvent {
    /// Short name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::InstantDownloadFinished { .. } => "instantDownloadFinished",
            BridgeEvent::InstantDownloadFailed { .. } => "instantDownloadFailed",
            BridgeEvent::InstantAuthenticationFinished { .. } => "instantAuthenticationFinished",
            BridgeEvent::InstantAuthenticationFailed { .. } => "instantAuthenticationFailed",
            BridgeEvent::InstantSyncStarted { .. } => "instantSyncStarted",
            BridgeEvent::InstantSyncFinished { .. } => "instantSyncFinished",
            BridgeEvent::InstantSyncFailed { .. } => "instantSyncFailed",
            BridgeEvent::DocumentLoaded { .. } => "documentLoaded",
            BridgeEvent::ViewWillDismiss => "viewWillDismiss",
            BridgeEvent::ViewDidDismiss => "viewDidDismiss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names() {
        let ev = BridgeEvent::InstantSyncFailed {
            document_id: DocumentId::new("doc-1"),
            error: "token expired".into(),
        };
        assert_eq!(ev.name(), "instantSyncFailed");
        assert_eq!(BridgeEvent::ViewWillDismiss.name(), "viewWillDismiss");
    }

    #[test]
    fn events_serialize_with_tag() {
        let ev = BridgeEvent::DocumentLoaded {
            document_id: DocumentId::new("doc-1"),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"event\":\"documentLoaded\""));
        assert!(json.contains("doc-1"));
    }

    #[test]
    fn failure_events_carry_error_description() {
        let ev = BridgeEvent::InstantDownloadFailed {
            document_id: DocumentId::new("doc-2"),
            error: "HTTP 503".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("HTTP 503"));
    }
}
