//! # bridge-types
//!
//! Foundational types for the pdfbridge document command bridge.
//!
//! This crate provides the types shared by every pdfbridge crate:
//! - [`RequestId`], [`DocumentId`] - Request correlation and document identity
//! - [`BridgeError`] - The structured error taxonomy surfaced over the bridge
//! - [`FormField`], [`FormFieldKind`], [`FormFieldState`] - Form element model
//! - [`ResponsePayload`], [`BridgeReply`] - Success payloads and reply envelope
//! - [`BridgeEvent`] - Outbound engine/host lifecycle notifications
//!
//! No I/O and no async happens here; everything is plain data.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod form;
mod ids;
mod ops;
mod payload;

pub use error::BridgeError;
pub use events::BridgeEvent;
pub use form::{FormField, FormFieldKind, FormFieldState};
pub use ids::{DocumentId, RequestId};
pub use ops::{AnnotationProcessingMode, AnnotationType, HtmlConversionOptions, PdfRect};
pub use payload::{BridgeReply, ResponsePayload};
