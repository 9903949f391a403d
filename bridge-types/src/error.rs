//! The structured error taxonomy surfaced over the bridge.
//!
//! Every failed operation terminates in exactly one of these errors,
//! delivered as a `{code, message, details}`-shaped payload. Engine
//! messages are preserved verbatim, never swallowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that terminate a bridge operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BridgeError {
    /// No active/valid document handle.
    #[error("no valid document is available")]
    DocumentUnavailable,

    /// Malformed or out-of-range input. The engine is never called.
    #[error("{message}")]
    InvalidArgument {
        /// Short human-readable summary.
        message: String,
        /// Detail string naming the offending value.
        details: String,
    },

    /// Operation not legal for the given field/document type.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// Form element found, but of a type the operation cannot handle.
    #[error("invalid form field type: {0}")]
    InvalidFieldType(String),

    /// Named form field does not exist.
    #[error("form field not found: {0}")]
    FieldNotFound(String),

    /// The delegated engine call reported an error. The engine's own
    /// message is carried through untouched.
    #[error("engine failure: {0}")]
    EngineFailure(String),

    /// Capability not implemented on this platform, surfaced explicitly
    /// rather than silently no-opped.
    #[error("not supported on this platform: {0}")]
    UnsupportedOnPlatform(String),
}

impl BridgeError {
    /// Short stable code for this error, suitable for a wire payload.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::DocumentUnavailable => "DocumentUnavailable",
            BridgeError::InvalidArgument { .. } => "InvalidArgument",
            BridgeError::UnsupportedOperation(_) => "UnsupportedOperation",
            BridgeError::InvalidFieldType(_) => "InvalidFieldType",
            BridgeError::FieldNotFound(_) => "FieldNotFound",
            BridgeError::EngineFailure(_) => "EngineFailure",
            BridgeError::UnsupportedOnPlatform(_) => "UnsupportedOnPlatform",
        }
    }

    /// Construct an [`BridgeError::InvalidArgument`] from a summary and detail.
    pub fn invalid_argument(message: impl Into<String>, details: impl Into<String>) -> Self {
        BridgeError::InvalidArgument {
            message: message.into(),
            details: details.into(),
        }
    }

    /// Detail string, when the variant carries one beyond its message.
    pub fn details(&self) -> Option<&str> {
        match self {
            BridgeError::InvalidArgument { details, .. } => Some(details),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BridgeError::DocumentUnavailable.code(), "DocumentUnavailable");
        assert_eq!(
            BridgeError::invalid_argument("bad page index", "index 9 out of range").code(),
            "InvalidArgument"
        );
        assert_eq!(
            BridgeError::FieldNotFound("age".into()).code(),
            "FieldNotFound"
        );
        assert_eq!(
            BridgeError::EngineFailure("corrupt xref table".into()).code(),
            "EngineFailure"
        );
    }

    #[test]
    fn display_is_human_readable() {
        let err = BridgeError::DocumentUnavailable;
        assert_eq!(err.to_string(), "no valid document is available");

        let err = BridgeError::invalid_argument("invalid page index", "got -1");
        assert_eq!(err.to_string(), "invalid page index");
        assert_eq!(err.details(), Some("got -1"));

        let err = BridgeError::FieldNotFound("signature1".into());
        assert_eq!(err.to_string(), "form field not found: signature1");
    }

    #[test]
    fn engine_message_is_preserved_verbatim() {
        let err = BridgeError::EngineFailure("PDF header missing at offset 0".into());
        assert!(err.to_string().contains("PDF header missing at offset 0"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BridgeError>();
    }
}
