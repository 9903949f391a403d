//! Success payloads and the reply envelope.

use crate::error::BridgeError;
use crate::ids::RequestId;
use crate::ops::PdfRect;
use serde::{Deserialize, Serialize};

/// The success payload of one completed operation.
///
/// Each operation kind maps to exactly one payload variant. Enumerating
/// operations accumulate every item into a single ordered [`JsonList`]
/// rather than streaming partial results.
///
/// [`JsonList`]: ResponsePayload::JsonList
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
    /// Boolean outcome (mutations, imports, save).
    Bool(bool),
    /// A string value (form value, exported JSON).
    Text(String),
    /// An ordered sequence of JSON strings (annotation enumeration).
    JsonList(Vec<String>),
    /// A page rectangle (visible-rect query).
    Rect(PdfRect),
    /// A scalar value (zoom scale).
    Scalar(f64),
    /// A filesystem path written by the engine (PDF generation).
    Path(String),
}

impl ResponsePayload {
    /// Short name of the payload variant, for logs and mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponsePayload::Bool(_) => "bool",
            ResponsePayload::Text(_) => "text",
            ResponsePayload::JsonList(_) => "jsonList",
            ResponsePayload::Rect(_) => "rect",
            ResponsePayload::Scalar(_) => "scalar",
            ResponsePayload::Path(_) => "path",
        }
    }
}

/// The single reply delivered for one submitted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    /// Id of the request this reply answers.
    pub request_id: RequestId,
    /// Success payload or structured error. Exactly one per request.
    pub result: Result<ResponsePayload, BridgeError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_names() {
        assert_eq!(ResponsePayload::Bool(true).kind(), "bool");
        assert_eq!(ResponsePayload::Text("x".into()).kind(), "text");
        assert_eq!(ResponsePayload::JsonList(vec![]).kind(), "jsonList");
        assert_eq!(
            ResponsePayload::Rect(PdfRect::new(0.0, 0.0, 1.0, 1.0)).kind(),
            "rect"
        );
        assert_eq!(ResponsePayload::Scalar(1.5).kind(), "scalar");
        assert_eq!(ResponsePayload::Path("/tmp/out.pdf".into()).kind(), "path");
    }

    #[test]
    fn reply_serde_round_trip() {
        let reply = BridgeReply {
            request_id: RequestId::new(),
            result: Ok(ResponsePayload::Text("selected".into())),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let back: BridgeReply = serde_json::from_str(&json).unwrap();
        assert_eq!(reply, back);
    }

    #[test]
    fn error_reply_serde_round_trip() {
        let reply = BridgeReply {
            request_id: RequestId::new(),
            result: Err(BridgeError::FieldNotFound("age".into())),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let back: BridgeReply = serde_json::from_str(&json).unwrap();
        assert_eq!(reply, back);
    }
}
