//! Error types for bridge-handle.
//!
//! The operation errors mirror the bridge's taxonomy one to one, so every
//! failure keeps its stable code across the handle boundary. The handle
//! adds its own lifecycle errors on top.

use bridge_types::BridgeError;
use thiserror::Error;

/// Errors from bridge-handle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Invalid session configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No active/valid document handle.
    #[error("no valid document is available")]
    DocumentUnavailable,

    /// Malformed or out-of-range input.
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

    /// The engine call failed; its message is carried through untouched.
    #[error("engine failure: {0}")]
    EngineFailure(String),

    /// Capability not implemented on this platform.
    #[error("not supported on this platform: {0}")]
    UnsupportedOnPlatform(String),

    /// The session was closed before the call completed.
    #[error("session closed")]
    Closed,

    /// The bridge replied with a payload shape the call cannot accept.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl HandleError {
    /// Short stable code for this error, suitable for a wire payload.
    pub fn code(&self) -> &'static str {
        match self {
            HandleError::InvalidConfig(_) => "InvalidConfig",
            HandleError::DocumentUnavailable => "DocumentUnavailable",
            HandleError::InvalidArgument { .. } => "InvalidArgument",
            HandleError::UnsupportedOperation(_) => "UnsupportedOperation",
            HandleError::InvalidFieldType(_) => "InvalidFieldType",
            HandleError::FieldNotFound(_) => "FieldNotFound",
            HandleError::EngineFailure(_) => "EngineFailure",
            HandleError::UnsupportedOnPlatform(_) => "UnsupportedOnPlatform",
            HandleError::Closed => "Closed",
            HandleError::Protocol(_) => "Protocol",
        }
    }
}

impl From<BridgeError> for HandleError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::DocumentUnavailable => HandleError::DocumentUnavailable,
            BridgeError::InvalidArgument { message, details } => {
                HandleError::InvalidArgument { message, details }
            }
            BridgeError::UnsupportedOperation(msg) => HandleError::UnsupportedOperation(msg),
            BridgeError::InvalidFieldType(field) => HandleError::InvalidFieldType(field),
            BridgeError::FieldNotFound(field) => HandleError::FieldNotFound(field),
            BridgeError::EngineFailure(msg) => HandleError::EngineFailure(msg),
            BridgeError::UnsupportedOnPlatform(msg) => HandleError::UnsupportedOnPlatform(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_keep_their_code_across_the_boundary() {
        let pairs: Vec<(BridgeError, &str)> = vec![
            (BridgeError::DocumentUnavailable, "DocumentUnavailable"),
            (
                BridgeError::invalid_argument("bad index", "got -3"),
                "InvalidArgument",
            ),
            (
                BridgeError::UnsupportedOperation("signature read".into()),
                "UnsupportedOperation",
            ),
            (BridgeError::InvalidFieldType("mystery".into()), "InvalidFieldType"),
            (BridgeError::FieldNotFound("age".into()), "FieldNotFound"),
            (BridgeError::EngineFailure("xref corrupt".into()), "EngineFailure"),
            (
                BridgeError::UnsupportedOnPlatform("html conversion".into()),
                "UnsupportedOnPlatform",
            ),
        ];
        for (bridge_err, code) in pairs {
            assert_eq!(bridge_err.code(), code);
            let handle_err: HandleError = bridge_err.into();
            assert_eq!(handle_err.code(), code);
        }
    }

    #[test]
    fn engine_message_survives_the_conversion_verbatim() {
        let err: HandleError =
            BridgeError::EngineFailure("page 3: content stream truncated".into()).into();
        assert!(err.to_string().contains("page 3: content stream truncated"));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            HandleError::InvalidConfig("missing document path".into()).to_string(),
            "invalid config: missing document path"
        );
        assert_eq!(HandleError::Closed.to_string(), "session closed");
        assert_eq!(
            HandleError::Protocol("expected bool payload, got rect".into()).to_string(),
            "protocol error: expected bool payload, got rect"
        );
    }
}
