//! Request validation, dispatch, and response delivery.
//!
//! Every operation passes through the same three stages:
//!
//! 1. validation, which never touches the engine for a rejected request
//! 2. execution, inline for cheap calls and on a spawned task for
//!    blocking ones
//! 3. delivery of exactly one reply per request over the callback channel
//!
//! # Design
//!
//! - Validation order is fixed: document validity, then page range, then
//!   collaboration gating, then argument shape. The first failure wins.
//! - An operation is delegated to the engine wholesale; there is no
//!   suspension point inside one beyond the dispatch itself.
//! - Teardown closes the channel and detaches the event sink. Background
//!   work already in flight is abandoned and its reply dropped.

use crate::channel::{CallbackChannel, Delivery};
use crate::engine::{DocumentEngine, EngineError};
use crate::events::{EventForwarder, EventSink};
use crate::forms;
use bridge_types::{
    AnnotationProcessingMode, AnnotationType, BridgeError, BridgeEvent, BridgeReply,
    HtmlConversionOptions, PdfRect, RequestId, ResponsePayload,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where an operation runs once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionClass {
    /// Cheap call, executed synchronously on the submitting context.
    Inline,
    /// Potentially blocking call, executed on a spawned task.
    Background,
}

/// One request against an open document session.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write a form field value in its string encoding.
    SetFormFieldValue {
        /// Fully qualified field name.
        fully_qualified_name: String,
        /// Encoded value to write.
        value: String,
    },
    /// Read a form field value in its string encoding.
    GetFormFieldValue {
        /// Fully qualified field name.
        fully_qualified_name: String,
    },
    /// Import a document-level JSON payload of annotation changes.
    ApplyInstantJson {
        /// The JSON payload.
        annotations_json: String,
    },
    /// Export the document-level JSON payload of annotation changes.
    ExportInstantJson,
    /// Create one annotation from its JSON representation.
    AddAnnotation {
        /// The annotation JSON.
        annotation_json: String,
    },
    /// Remove the annotation matching the given JSON representation.
    RemoveAnnotation {
        /// The annotation JSON.
        annotation_json: String,
    },
    /// Enumerate annotations of one type on one page.
    GetAnnotations {
        /// Zero-based page index, unvalidated.
        page_index: i64,
        /// Type selector.
        annotation_type: AnnotationType,
    },
    /// Export all not-yet-saved annotation changes as JSON.
    GetAllUnsavedAnnotations,
    /// Process annotations into a new file at the destination path.
    ProcessAnnotations {
        /// Type selector.
        annotation_type: AnnotationType,
        /// Processing mode.
        processing_mode: AnnotationProcessingMode,
        /// Output file path. Missing parent directories are created.
        destination_path: PathBuf,
    },
    /// Import an XFDF payload.
    ImportXfdf {
        /// The XFDF document.
        xfdf: String,
    },
    /// Export annotations as XFDF to the destination path.
    ExportXfdf {
        /// Output file path. Missing parent directories are created.
        destination_path: PathBuf,
    },
    /// Persist pending changes.
    Save,
    /// Trigger a sync cycle with the collaboration server.
    SyncAnnotations,
    /// Set the delay before local changes are synced.
    SetSyncDelay {
        /// Delay in seconds, non-negative.
        seconds: f64,
    },
    /// Enable or disable listening for server-side changes.
    SetListenToServerChanges {
        /// Whether to listen.
        listen: bool,
    },
    /// Install annotation preset configurations on the view.
    SetAnnotationConfigurations {
        /// Preset name to configuration mapping.
        configurations: HashMap<String, serde_json::Value>,
    },
    /// Visible rectangle of one page.
    GetVisibleRect {
        /// Zero-based page index, unvalidated.
        page_index: i64,
    },
    /// Zoom the view to a rectangle on one page.
    ZoomToRect {
        /// Zero-based page index, unvalidated.
        page_index: i64,
        /// Target rectangle in PDF coordinates.
        rect: PdfRect,
        /// Whether to animate the transition.
        animated: bool,
        /// Animation duration override in seconds.
        duration_seconds: Option<f64>,
    },
    /// Current zoom scale of one page.
    GetZoomScale {
        /// Zero-based page index, unvalidated.
        page_index: i64,
    },
    /// Generate a PDF from an HTML string.
    GeneratePdfFromHtml {
        /// Source HTML.
        html: String,
        /// Output file path. Missing parent directories are created.
        output_path: PathBuf,
        /// Conversion options.
        options: HtmlConversionOptions,
    },
    /// Generate a PDF from a page-description list.
    GeneratePdf {
        /// Page descriptions.
        pages: Vec<serde_json::Value>,
        /// Output file path. Missing parent directories are created.
        output_path: PathBuf,
    },
}

impl Operation {
    /// The caller-facing name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetFormFieldValue { .. } => "setFormFieldValue",
            Operation::GetFormFieldValue { .. } => "getFormFieldValue",
            Operation::ApplyInstantJson { .. } => "applyInstantJson",
            Operation::ExportInstantJson => "exportInstantJson",
            Operation::AddAnnotation { .. } => "addAnnotation",
            Operation::RemoveAnnotation { .. } => "removeAnnotation",
            Operation::GetAnnotations { .. } => "getAnnotations",
            Operation::GetAllUnsavedAnnotations => "getAllUnsavedAnnotations",
            Operation::ProcessAnnotations { .. } => "processAnnotations",
            Operation::ImportXfdf { .. } => "importXfdf",
            Operation::ExportXfdf { .. } => "exportXfdf",
            Operation::Save => "save",
            Operation::SyncAnnotations => "syncAnnotations",
            Operation::SetSyncDelay { .. } => "setDelayForSyncingLocalChanges",
            Operation::SetListenToServerChanges { .. } => "setListenToServerChanges",
            Operation::SetAnnotationConfigurations { .. } => "setAnnotationConfigurations",
            Operation::GetVisibleRect { .. } => "getVisibleRect",
            Operation::ZoomToRect { .. } => "zoomToRect",
            Operation::GetZoomScale { .. } => "getZoomScale",
            Operation::GeneratePdfFromHtml { .. } => "generatePdfFromHtml",
            Operation::GeneratePdf { .. } => "generatePdf",
        }
    }

    /// Which context the operation runs on.
    ///
    /// Annotation removal is classified with addition rather than
    /// mirroring the historical per-platform asymmetry.
    pub fn execution_class(&self) -> ExecutionClass {
        match self {
            Operation::SetFormFieldValue { .. }
            | Operation::GetFormFieldValue { .. }
            | Operation::ApplyInstantJson { .. }
            | Operation::ExportInstantJson
            | Operation::AddAnnotation { .. }
            | Operation::RemoveAnnotation { .. }
            | Operation::GetAnnotations { .. }
            | Operation::GetAllUnsavedAnnotations
            | Operation::ProcessAnnotations { .. }
            | Operation::ImportXfdf { .. }
            | Operation::ExportXfdf { .. }
            | Operation::Save
            | Operation::GeneratePdfFromHtml { .. }
            | Operation::GeneratePdf { .. } => ExecutionClass::Background,
            Operation::SyncAnnotations
            | Operation::SetSyncDelay { .. }
            | Operation::SetListenToServerChanges { .. }
            | Operation::SetAnnotationConfigurations { .. }
            | Operation::GetVisibleRect { .. }
            | Operation::ZoomToRect { .. }
            | Operation::GetZoomScale { .. } => ExecutionClass::Inline,
        }
    }

    /// Whether the operation needs a valid open document.
    ///
    /// Document generation writes a new file and runs without one.
    fn requires_document(&self) -> bool {
        !matches!(
            self,
            Operation::GeneratePdfFromHtml { .. } | Operation::GeneratePdf { .. }
        )
    }

    /// The page index argument, when the operation has one.
    fn page_index(&self) -> Option<i64> {
        match self {
            Operation::GetAnnotations { page_index, .. }
            | Operation::GetVisibleRect { page_index }
            | Operation::ZoomToRect { page_index, .. }
            | Operation::GetZoomScale { page_index } => Some(*page_index),
            _ => None,
        }
    }

    /// Whether the operation only makes sense on a collaboration-connected
    /// document.
    fn requires_instant(&self) -> bool {
        matches!(
            self,
            Operation::SyncAnnotations
                | Operation::SetSyncDelay { .. }
                | Operation::SetListenToServerChanges { .. }
        )
    }
}

impl From<EngineError> for BridgeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Failure(message) => BridgeError::EngineFailure(message),
            EngineError::Unsupported(message) => BridgeError::UnsupportedOnPlatform(message),
        }
    }
}

/// The command bridge for one open document session.
///
/// Submissions are synchronous; replies arrive on the receiver handed out
/// by [`DocumentBridge::new`], exactly one per request. Background work
/// requires a Tokio runtime context at submission time.
pub struct DocumentBridge {
    engine: Arc<dyn DocumentEngine>,
    channel: CallbackChannel,
    events: EventForwarder,
}

impl DocumentBridge {
    /// Wire a bridge to an engine; returns the bridge and its reply stream.
    pub fn new(engine: Arc<dyn DocumentEngine>) -> (Self, mpsc::UnboundedReceiver<BridgeReply>) {
        let (channel, rx) = CallbackChannel::register();
        let bridge = Self {
            engine,
            channel,
            events: EventForwarder::new(),
        };
        (bridge, rx)
    }

    /// Submit an operation under a fresh request id.
    pub fn submit(&self, operation: Operation) -> RequestId {
        let request_id = RequestId::new();
        self.submit_with_id(request_id, operation);
        request_id
    }

    /// Submit an operation under a caller-chosen request id.
    ///
    /// Inline operations reply before this returns, so any waiter keyed on
    /// the id must be registered first.
    pub fn submit_with_id(&self, request_id: RequestId, operation: Operation) {
        let delivery = self.channel.delivery(request_id);
        if let Err(err) = self.validate(&operation) {
            tracing::debug!(
                %request_id,
                op = operation.name(),
                error = %err,
                "request rejected before reaching the engine"
            );
            delivery.respond(Err(err));
            return;
        }
        match operation.execution_class() {
            ExecutionClass::Inline => {
                let result = execute_inline(self.engine.as_ref(), &operation);
                delivery.respond(result);
            }
            ExecutionClass::Background => {
                let engine = Arc::clone(&self.engine);
                tokio::spawn(run_background(engine, operation, delivery));
            }
        }
    }

    /// Attach the sink that receives engine events.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        self.events.set_sink(sink);
    }

    /// Detach the event sink.
    pub fn clear_event_sink(&self) {
        self.events.clear_sink();
    }

    /// Forward one engine event to the attached sink.
    pub fn forward_event(&self, event: BridgeEvent) {
        self.events.forward(event);
    }

    /// Tear the session down.
    ///
    /// Closes the reply channel and detaches the event sink. In-flight
    /// background operations are abandoned; their replies are dropped.
    pub fn teardown(&self) {
        tracing::debug!("tearing down document bridge");
        self.channel.close();
        self.events.clear_sink();
    }

    /// Whether the bridge still delivers replies.
    pub fn is_active(&self) -> bool {
        self.channel.is_open()
    }

    /// Reject bad requests before the engine sees them.
    fn validate(&self, operation: &Operation) -> Result<(), BridgeError> {
        if operation.requires_document() && !self.engine.is_valid() {
            return Err(BridgeError::DocumentUnavailable);
        }

        if let Some(page_index) = operation.page_index() {
            let page_count = self.engine.page_count();
            if page_index < 0 || page_index >= i64::from(page_count) {
                return Err(BridgeError::invalid_argument(
                    "page index out of range",
                    format!("page index {page_index} not in 0..{page_count}"),
                ));
            }
        }

        if operation.requires_instant() && !self.engine.supports_instant_sync() {
            return Err(BridgeError::UnsupportedOperation(format!(
                "{} requires a document connected to a collaboration server",
                operation.name()
            )));
        }

        match operation {
            Operation::SetFormFieldValue {
                fully_qualified_name,
                ..
            }
            | Operation::GetFormFieldValue {
                fully_qualified_name,
            } if fully_qualified_name.is_empty() => Err(BridgeError::invalid_argument(
                "missing form field name",
                "fully qualified field name must not be empty",
            )),
            Operation::ApplyInstantJson { annotations_json } => {
                require_json("applyInstantJson", annotations_json)
            }
            Operation::AddAnnotation { annotation_json } => {
                require_json("addAnnotation", annotation_json)
            }
            Operation::RemoveAnnotation { annotation_json } => {
                require_json("removeAnnotation", annotation_json)
            }
            Operation::ImportXfdf { xfdf } if xfdf.is_empty() => Err(
                BridgeError::invalid_argument("missing XFDF payload", "XFDF must not be empty"),
            ),
            Operation::ProcessAnnotations {
                destination_path, ..
            }
            | Operation::ExportXfdf { destination_path } => {
                require_path("destination path", destination_path)
            }
            Operation::ZoomToRect {
                rect,
                duration_seconds,
                ..
            } => {
                if !rect.is_finite() {
                    return Err(BridgeError::invalid_argument(
                        "non-finite rectangle",
                        format!("rect {rect:?} has a non-finite coordinate"),
                    ));
                }
                match duration_seconds {
                    Some(d) if !d.is_finite() || *d < 0.0 => Err(BridgeError::invalid_argument(
                        "invalid animation duration",
                        format!("duration {d} must be a non-negative finite number"),
                    )),
                    _ => Ok(()),
                }
            }
            Operation::SetSyncDelay { seconds } if !seconds.is_finite() || *seconds < 0.0 => {
                Err(BridgeError::invalid_argument(
                    "invalid sync delay",
                    format!("delay {seconds} must be a non-negative finite number"),
                ))
            }
            Operation::GeneratePdfFromHtml {
                html, output_path, ..
            } => {
                if html.is_empty() {
                    return Err(BridgeError::invalid_argument(
                        "missing HTML source",
                        "HTML must not be empty",
                    ));
                }
                require_path("output path", output_path)
            }
            Operation::GeneratePdf { pages, output_path } => {
                if pages.is_empty() {
                    return Err(BridgeError::invalid_argument(
                        "missing page descriptions",
                        "at least one page description is required",
                    ));
                }
                require_path("output path", output_path)
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for DocumentBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBridge")
            .field("active", &self.is_active())
            .field("events", &self.events)
            .finish()
    }
}

fn require_json(op: &str, payload: &str) -> Result<(), BridgeError> {
    if payload.is_empty() {
        return Err(BridgeError::invalid_argument(
            "missing JSON payload",
            format!("{op} requires a non-empty JSON payload"),
        ));
    }
    serde_json::from_str::<serde_json::Value>(payload).map_err(|e| {
        BridgeError::invalid_argument("malformed JSON payload", format!("{op}: {e}"))
    })?;
    Ok(())
}

fn require_path(what: &str, path: &Path) -> Result<(), BridgeError> {
    if path.as_os_str().is_empty() {
        return Err(BridgeError::invalid_argument(
            format!("missing {what}"),
            format!("{what} must not be empty"),
        ));
    }
    Ok(())
}

/// Make the destination's parent directory exist.
async fn prepare_destination(path: &Path) -> Result<(), BridgeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BridgeError::invalid_argument(
                    "destination directory not creatable",
                    format!("{}: {e}", parent.display()),
                )
            })?;
        }
    }
    Ok(())
}

/// Inline execution path. Never awaits.
fn execute_inline(
    engine: &dyn DocumentEngine,
    operation: &Operation,
) -> Result<ResponsePayload, BridgeError> {
    match operation {
        Operation::SyncAnnotations => {
            engine.sync_annotations()?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::SetSyncDelay { seconds } => {
            engine.set_sync_delay(*seconds)?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::SetListenToServerChanges { listen } => {
            engine.set_listen_to_server_changes(*listen)?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::SetAnnotationConfigurations { configurations } => {
            engine.set_annotation_configurations(configurations.clone())?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::GetVisibleRect { page_index } => {
            let rect = engine.visible_rect(*page_index as u32)?;
            Ok(ResponsePayload::Rect(rect))
        }
        Operation::ZoomToRect {
            page_index,
            rect,
            animated,
            duration_seconds,
        } => {
            engine.zoom_to_rect(*page_index as u32, *rect, *animated, *duration_seconds)?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::GetZoomScale { page_index } => {
            let scale = engine.zoom_scale(*page_index as u32)?;
            Ok(ResponsePayload::Scalar(scale))
        }
        _ => unreachable!("background operation dispatched inline: {}", operation.name()),
    }
}

async fn run_background(engine: Arc<dyn DocumentEngine>, operation: Operation, delivery: Delivery) {
    let name = operation.name();
    let result = execute_background(engine.as_ref(), operation).await;
    if let Err(err) = &result {
        tracing::debug!(request_id = %delivery.request_id(), op = name, error = %err, "operation failed");
    }
    delivery.respond(result);
}

/// Background execution path.
async fn execute_background(
    engine: &dyn DocumentEngine,
    operation: Operation,
) -> Result<ResponsePayload, BridgeError> {
    match operation {
        Operation::SetFormFieldValue {
            fully_qualified_name,
            value,
        } => {
            let field = engine
                .find_form_field(&fully_qualified_name)
                .await?
                .ok_or_else(|| BridgeError::FieldNotFound(fully_qualified_name.clone()))?;
            let state = forms::write_form_value(&field, &value)?;
            engine
                .set_form_field_state(&fully_qualified_name, state)
                .await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::GetFormFieldValue {
            fully_qualified_name,
        } => {
            let field = engine
                .find_form_field(&fully_qualified_name)
                .await?
                .ok_or(BridgeError::FieldNotFound(fully_qualified_name))?;
            Ok(ResponsePayload::Text(forms::read_form_value(&field)?))
        }
        Operation::ApplyInstantJson { annotations_json } => {
            engine.apply_instant_json(&annotations_json).await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::ExportInstantJson => {
            let json = engine.export_instant_json().await?;
            Ok(ResponsePayload::Text(json))
        }
        Operation::AddAnnotation { annotation_json } => {
            engine.add_annotation(&annotation_json).await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::RemoveAnnotation { annotation_json } => {
            engine.remove_annotation(&annotation_json).await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::GetAnnotations {
            page_index,
            annotation_type,
        } => {
            let items = engine
                .annotations_on_page(page_index as u32, annotation_type)
                .await?;
            Ok(ResponsePayload::JsonList(items))
        }
        Operation::GetAllUnsavedAnnotations => {
            let json = engine.unsaved_annotations_json().await?;
            Ok(ResponsePayload::Text(json))
        }
        Operation::ProcessAnnotations {
            annotation_type,
            processing_mode,
            destination_path,
        } => {
            prepare_destination(&destination_path).await?;
            engine
                .process_annotations(annotation_type, processing_mode, &destination_path)
                .await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::ImportXfdf { xfdf } => {
            engine.import_xfdf(&xfdf).await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::ExportXfdf { destination_path } => {
            prepare_destination(&destination_path).await?;
            engine.export_xfdf(&destination_path).await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::Save => {
            engine.save().await?;
            Ok(ResponsePayload::Bool(true))
        }
        Operation::GeneratePdfFromHtml {
            html,
            output_path,
            options,
        } => {
            prepare_destination(&output_path).await?;
            let written = engine
                .generate_pdf_from_html(&html, &output_path, &options)
                .await?;
            Ok(ResponsePayload::Path(written))
        }
        Operation::GeneratePdf { pages, output_path } => {
            prepare_destination(&output_path).await?;
            let written = engine.generate_pdf(&pages, &output_path).await?;
            Ok(ResponsePayload::Path(written))
        }
        _ => unreachable!("inline operation dispatched to background: {}", operation.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use bridge_types::{DocumentId, FormField};

    fn bridge() -> (
        DocumentBridge,
        mpsc::UnboundedReceiver<BridgeReply>,
        MockEngine,
    ) {
        let engine = MockEngine::new();
        let (bridge, rx) = DocumentBridge::new(Arc::new(engine.clone()));
        (bridge, rx, engine)
    }

    async fn reply_for(
        rx: &mut mpsc::UnboundedReceiver<BridgeReply>,
        id: RequestId,
    ) -> Result<ResponsePayload, BridgeError> {
        let reply = rx.recv().await.expect("reply channel closed");
        assert_eq!(reply.request_id, id);
        reply.result
    }

    // ===========================================
    // Identity and delivery
    // ===========================================

    #[tokio::test]
    async fn each_submission_gets_a_distinct_id_and_exactly_one_reply() {
        let (bridge, mut rx, _engine) = bridge();

        let a = bridge.submit(Operation::Save);
        let b = bridge.submit(Operation::Save);
        assert_ne!(a, b);

        let mut seen = vec![
            rx.recv().await.unwrap().request_id,
            rx.recv().await.unwrap().request_id,
        ];
        seen.sort_by_key(|id| id.to_string());
        let mut expected = vec![a, b];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(seen, expected);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn inline_operations_reply_before_submit_returns() {
        let (bridge, mut rx, _engine) = bridge();

        let id = bridge.submit(Operation::GetVisibleRect { page_index: 0 });

        // No await between submit and try_recv.
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.request_id, id);
        assert_eq!(
            reply.result,
            Ok(ResponsePayload::Rect(PdfRect::new(0.0, 0.0, 612.0, 792.0)))
        );
    }

    // ===========================================
    // Validation
    // ===========================================

    #[tokio::test]
    async fn invalid_document_fails_without_touching_the_engine() {
        let (bridge, mut rx, engine) = bridge();
        engine.set_valid(false);

        let id = bridge.submit(Operation::Save);

        let result = reply_for(&mut rx, id).await;
        assert_eq!(result, Err(BridgeError::DocumentUnavailable));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_page_index_never_reaches_the_engine() {
        let (bridge, mut rx, engine) = bridge();

        for page_index in [-1_i64, 10, i64::MAX] {
            let id = bridge.submit(Operation::GetAnnotations {
                page_index,
                annotation_type: AnnotationType::All,
            });
            let err = reply_for(&mut rx, id).await.unwrap_err();
            assert_eq!(err.code(), "InvalidArgument");
            assert!(err.details().unwrap().contains(&page_index.to_string()));
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_fails_before_the_engine() {
        let (bridge, mut rx, engine) = bridge();

        let id = bridge.submit(Operation::ApplyInstantJson {
            annotations_json: "{not json".into(),
        });
        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");

        let id = bridge.submit(Operation::AddAnnotation {
            annotation_json: String::new(),
        });
        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");

        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn non_finite_rect_is_rejected() {
        let (bridge, mut rx, engine) = bridge();

        let id = bridge.submit(Operation::ZoomToRect {
            page_index: 0,
            rect: PdfRect::new(0.0, f64::NAN, 100.0, 100.0),
            animated: false,
            duration_seconds: None,
        });

        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn sync_operations_require_a_collaboration_document() {
        let (bridge, mut rx, engine) = bridge();

        let id = bridge.submit(Operation::SyncAnnotations);
        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperation");
        assert_eq!(engine.sync_count(), 0);

        engine.set_instant(true);
        let id = bridge.submit(Operation::SyncAnnotations);
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Bool(true))
        );
        assert_eq!(engine.sync_count(), 1);
    }

    // ===========================================
    // Form fields
    // ===========================================

    #[tokio::test]
    async fn set_then_get_form_field_value() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_form_field(FormField::text("name", ""));

        let id = bridge.submit(Operation::SetFormFieldValue {
            fully_qualified_name: "name".into(),
            value: "Ada".into(),
        });
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Bool(true))
        );

        let id = bridge.submit(Operation::GetFormFieldValue {
            fully_qualified_name: "name".into(),
        });
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Text("Ada".into()))
        );
    }

    #[tokio::test]
    async fn missing_field_is_field_not_found() {
        let (bridge, mut rx, _engine) = bridge();

        let id = bridge.submit(Operation::GetFormFieldValue {
            fully_qualified_name: "ghost".into(),
        });

        assert_eq!(
            reply_for(&mut rx, id).await,
            Err(BridgeError::FieldNotFound("ghost".into()))
        );
    }

    #[tokio::test]
    async fn field_lookup_failure_is_engine_failure_with_verbatim_message() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_form_field(FormField::text("name", "Ada"));
        engine.fail_next("find_form_field", "form index damaged");

        let id = bridge.submit(Operation::GetFormFieldValue {
            fully_qualified_name: "name".into(),
        });

        assert_eq!(
            reply_for(&mut rx, id).await,
            Err(BridgeError::EngineFailure("form index damaged".into()))
        );
    }

    #[tokio::test]
    async fn bad_button_token_fails_before_the_write() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_form_field(FormField::button("optIn", false));

        let id = bridge.submit(Operation::SetFormFieldValue {
            fully_qualified_name: "optIn".into(),
            value: "yes".into(),
        });

        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
        assert_eq!(engine.call_count("set_form_field_state"), 0);
    }

    #[tokio::test]
    async fn signature_fields_are_refused() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_form_field(FormField::signature("sig"));

        let id = bridge.submit(Operation::GetFormFieldValue {
            fully_qualified_name: "sig".into(),
        });
        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperation");

        let id = bridge.submit(Operation::SetFormFieldValue {
            fully_qualified_name: "sig".into(),
            value: "x".into(),
        });
        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperation");
    }

    #[tokio::test]
    async fn choice_values_round_trip_in_index_encoding() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_form_field(FormField::choice("colors", vec![]));

        let id = bridge.submit(Operation::SetFormFieldValue {
            fully_qualified_name: "colors".into(),
            value: "1,3,5".into(),
        });
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Bool(true))
        );

        let id = bridge.submit(Operation::GetFormFieldValue {
            fully_qualified_name: "colors".into(),
        });
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Text("1,3,5".into()))
        );
    }

    // ===========================================
    // Annotations
    // ===========================================

    #[tokio::test]
    async fn annotations_accumulate_into_one_ordered_list() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_page_annotation(1, AnnotationType::Ink, r#"{"name":"first"}"#);
        engine.add_page_annotation(1, AnnotationType::Highlight, r#"{"name":"second"}"#);
        engine.add_page_annotation(2, AnnotationType::Ink, r#"{"name":"elsewhere"}"#);

        let id = bridge.submit(Operation::GetAnnotations {
            page_index: 1,
            annotation_type: AnnotationType::All,
        });

        let payload = reply_for(&mut rx, id).await.unwrap();
        assert_eq!(
            payload,
            ResponsePayload::JsonList(vec![
                r#"{"name":"first"}"#.into(),
                r#"{"name":"second"}"#.into(),
            ])
        );
    }

    #[tokio::test]
    async fn exported_instant_json_can_be_applied_back() {
        let (bridge, mut rx, engine) = bridge();
        engine.add_page_annotation(0, AnnotationType::Ink, r#"{"type":"ink","pageIndex":0}"#);

        let id = bridge.submit(Operation::ExportInstantJson);
        let exported = match reply_for(&mut rx, id).await.unwrap() {
            ResponsePayload::Text(json) => json,
            other => panic!("expected text payload, got {}", other.kind()),
        };

        let id = bridge.submit(Operation::ApplyInstantJson {
            annotations_json: exported.clone(),
        });
        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Bool(true))
        );
        assert_eq!(engine.applied_instant_json(), vec![exported]);
    }

    #[tokio::test]
    async fn engine_failure_message_is_preserved_verbatim() {
        let (bridge, mut rx, engine) = bridge();
        engine.fail_next("save", "disk full while writing increment");

        let id = bridge.submit(Operation::Save);

        assert_eq!(
            reply_for(&mut rx, id).await,
            Err(BridgeError::EngineFailure(
                "disk full while writing increment".into()
            ))
        );
    }

    #[tokio::test]
    async fn process_annotations_creates_missing_destination_directories() {
        let (bridge, mut rx, engine) = bridge();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("flat.pdf");

        let id = bridge.submit(Operation::ProcessAnnotations {
            annotation_type: AnnotationType::All,
            processing_mode: AnnotationProcessingMode::Flatten,
            destination_path: path.clone(),
        });

        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Bool(true))
        );
        assert!(path.exists());
        assert_eq!(engine.processed().len(), 1);
    }

    // ===========================================
    // Document generation
    // ===========================================

    #[tokio::test]
    async fn pdf_generation_works_without_an_open_document() {
        let (bridge, mut rx, engine) = bridge();
        engine.set_valid(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.pdf");

        let id = bridge.submit(Operation::GeneratePdfFromHtml {
            html: "<h1>Invoice</h1>".into(),
            output_path: path.clone(),
            options: HtmlConversionOptions::default(),
        });

        assert_eq!(
            reply_for(&mut rx, id).await,
            Ok(ResponsePayload::Path(path.display().to_string()))
        );
        assert!(path.exists());
    }

    #[tokio::test]
    async fn generate_pdf_rejects_an_empty_page_list() {
        let (bridge, mut rx, _engine) = bridge();

        let id = bridge.submit(Operation::GeneratePdf {
            pages: vec![],
            output_path: PathBuf::from("/tmp/out.pdf"),
        });

        let err = reply_for(&mut rx, id).await.unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
    }

    // ===========================================
    // Teardown
    // ===========================================

    #[tokio::test]
    async fn teardown_drops_replies_from_in_flight_work() {
        let (bridge, mut rx, engine) = bridge();
        let gate = engine.hold_next_op();

        bridge.submit(Operation::Save);
        bridge.teardown();
        assert!(!bridge.is_active());

        gate.notify_one();
        while engine.save_count() == 0 {
            tokio::task::yield_now().await;
        }

        // The save ran to completion but its reply was discarded.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn submissions_after_teardown_are_dropped_silently() {
        let (bridge, mut rx, _engine) = bridge();
        bridge.teardown();

        bridge.submit(Operation::GetZoomScale { page_index: 0 });

        assert!(rx.try_recv().is_err());
    }

    // ===========================================
    // Events
    // ===========================================

    #[tokio::test]
    async fn engine_events_are_forwarded_to_the_attached_sink() {
        let (bridge, _rx, _engine) = bridge();
        let (tx, mut events) = mpsc::unbounded_channel();
        bridge.set_event_sink(Arc::new(tx));

        bridge.forward_event(BridgeEvent::InstantSyncFinished {
            document_id: DocumentId::new("doc-7"),
        });

        assert_eq!(events.recv().await.unwrap().name(), "instantSyncFinished");
    }

    #[tokio::test]
    async fn teardown_detaches_the_event_sink() {
        let (bridge, _rx, _engine) = bridge();
        let (tx, mut events) = mpsc::unbounded_channel();
        bridge.set_event_sink(Arc::new(tx));

        bridge.teardown();
        bridge.forward_event(BridgeEvent::ViewDidDismiss);

        assert!(events.recv().await.is_none());
    }
}
