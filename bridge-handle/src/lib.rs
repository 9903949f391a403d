//! # bridge-handle
//!
//! Session-oriented handle over the command bridge in `pdfbridge-core`.
//!
//! This crate turns the submit/reply surface of
//! [`DocumentBridge`](bridge_core::DocumentBridge) into flat async methods
//! that embedders (FFI shims, message-channel adapters) can wrap directly:
//! one call, one awaited result.
//!
//! ## Design
//!
//! - One [`BridgeHandle`] per open document session
//! - Replies are routed back to callers by request id; a background task
//!   drains the bridge's reply stream
//! - `close` tears the session down: in-flight calls resolve to
//!   [`HandleError::Closed`], late engine results are dropped

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod handle;
pub mod types;

pub use error::HandleError;
pub use handle::BridgeHandle;
pub use types::{InstantConfig, SessionConfig};
