//! Document engine abstraction.
//!
//! This module provides the pluggable boundary to the native document
//! engine (PDF parsing, annotation model, form model, rendering). The
//! engine owns every document; the bridge holds a non-owning reference
//! and revalidates it before each use.
//!
//! # Design
//!
//! - Cheap accessors and viewport queries are synchronous.
//! - Everything I/O- or CPU-heavy is async and treated as opaque: the
//!   bridge delegates wholesale and never yields inside an operation.
//! - `find_form_field` is three-way: `Err` is a lookup failure, `Ok(None)`
//!   is element-not-found, `Ok(Some)` is found. Exactly one fires per call.

mod mock;

pub use mock::MockEngine;

use async_trait::async_trait;
use bridge_types::{
    AnnotationProcessingMode, AnnotationType, FormField, FormFieldState, HtmlConversionOptions,
    PdfRect,
};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors reported by the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine call failed. The message is surfaced verbatim to callers.
    #[error("{0}")]
    Failure(String),

    /// The engine does not implement this capability on this platform.
    #[error("{0}")]
    Unsupported(String),
}

impl EngineError {
    /// Construct a [`EngineError::Failure`] from any message.
    pub fn failure(message: impl Into<String>) -> Self {
        EngineError::Failure(message.into())
    }
}

/// The native document engine, consumed as a black box.
///
/// One implementation is bound per open document session. Mutating calls
/// are applied to the engine's live in-memory document; persistence only
/// happens on an explicit `save`. The bridge imposes no locking on top of
/// the engine's own thread safety.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Whether the document handle is currently usable. Checked immediately
    /// before each operation; a handle may go invalid at any time.
    fn is_valid(&self) -> bool;

    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Whether this document is connected to a collaboration server.
    fn supports_instant_sync(&self) -> bool;

    // --- Viewport (cheap, synchronous) ---

    /// Visible rectangle of the given page in PDF coordinates.
    fn visible_rect(&self, page_index: u32) -> Result<PdfRect, EngineError>;

    /// Zoom the view to a rectangle on the given page.
    fn zoom_to_rect(
        &self,
        page_index: u32,
        rect: PdfRect,
        animated: bool,
        duration_seconds: Option<f64>,
    ) -> Result<(), EngineError>;

    /// Current zoom scale of the given page.
    fn zoom_scale(&self, page_index: u32) -> Result<f64, EngineError>;

    // --- Instant collaboration (cheap, synchronous) ---

    /// Trigger a sync cycle with the collaboration server.
    fn sync_annotations(&self) -> Result<(), EngineError>;

    /// Set the delay before local changes are synced.
    fn set_sync_delay(&self, seconds: f64) -> Result<(), EngineError>;

    /// Enable or disable listening for server-side changes.
    fn set_listen_to_server_changes(&self, listen: bool) -> Result<(), EngineError>;

    /// Install annotation preset configurations on the view.
    fn set_annotation_configurations(
        &self,
        configurations: HashMap<String, serde_json::Value>,
    ) -> Result<(), EngineError>;

    // --- Forms ---

    /// Look up a form element by fully qualified name.
    async fn find_form_field(
        &self,
        fully_qualified_name: &str,
    ) -> Result<Option<FormField>, EngineError>;

    /// Apply a new typed state to a form element.
    async fn set_form_field_state(
        &self,
        fully_qualified_name: &str,
        state: FormFieldState,
    ) -> Result<(), EngineError>;

    // --- Annotations and document JSON ---

    /// Import a document-level JSON payload of annotation changes.
    async fn apply_instant_json(&self, json: &str) -> Result<(), EngineError>;

    /// Export the document-level JSON payload of annotation changes.
    async fn export_instant_json(&self) -> Result<String, EngineError>;

    /// Create one annotation from its JSON representation.
    async fn add_annotation(&self, json: &str) -> Result<(), EngineError>;

    /// Remove the annotation matching the given JSON representation.
    async fn remove_annotation(&self, json: &str) -> Result<(), EngineError>;

    /// All annotations of the given type on one page, as JSON strings,
    /// in document order.
    async fn annotations_on_page(
        &self,
        page_index: u32,
        annotation_type: AnnotationType,
    ) -> Result<Vec<String>, EngineError>;

    /// JSON payload of all not-yet-saved annotation changes.
    async fn unsaved_annotations_json(&self) -> Result<String, EngineError>;

    /// Process (flatten/remove/embed/print) annotations into a new file.
    async fn process_annotations(
        &self,
        annotation_type: AnnotationType,
        mode: AnnotationProcessingMode,
        destination: &Path,
    ) -> Result<(), EngineError>;

    // --- XFDF ---

    /// Parse an XFDF payload and attach its annotations to the document.
    async fn import_xfdf(&self, xfdf: &str) -> Result<(), EngineError>;

    /// Write the document's annotations as XFDF to the given path.
    async fn export_xfdf(&self, destination: &Path) -> Result<(), EngineError>;

    // --- Persistence ---

    /// Persist pending changes, if any.
    async fn save(&self) -> Result<(), EngineError>;

    // --- Document generation (does not need a live document handle) ---

    /// Generate a PDF from an HTML string; returns the written path.
    async fn generate_pdf_from_html(
        &self,
        html: &str,
        destination: &Path,
        options: &HtmlConversionOptions,
    ) -> Result<String, EngineError>;

    /// Generate a PDF from a page-description list; returns the written path.
    async fn generate_pdf(
        &self,
        pages: &[serde_json::Value],
        destination: &Path,
    ) -> Result<String, EngineError>;
}
