//! BridgeHandle: awaitable calls over the submit/reply bridge.
//!
//! The bridge delivers every reply on one stream; the handle routes each
//! reply back to its caller by request id. The waiter is registered
//! before submission, so inline operations that reply synchronously are
//! never lost.

use crate::error::HandleError;
use crate::types::SessionConfig;
use bridge_core::{DocumentBridge, DocumentEngine, EventSink, Operation};
use bridge_types::{
    AnnotationProcessingMode, AnnotationType, BridgeEvent, HtmlConversionOptions, PdfRect,
    RequestId, ResponsePayload,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type PendingMap = DashMap<RequestId, oneshot::Sender<Result<ResponsePayload, HandleError>>>;

/// One open document session, exposed as flat async methods.
///
/// Must be created and used inside a Tokio runtime. Dropping the handle
/// closes the session.
pub struct BridgeHandle {
    bridge: DocumentBridge,
    pending: Arc<PendingMap>,
    router: tokio::task::JoinHandle<()>,
    closed: AtomicBool,
    config: SessionConfig,
}

impl BridgeHandle {
    /// Open a session over the given engine.
    pub fn open(
        config: SessionConfig,
        engine: Arc<dyn DocumentEngine>,
    ) -> Result<Self, HandleError> {
        config.validate()?;
        let (bridge, mut replies) = DocumentBridge::new(engine);
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());

        let router = {
            let pending = Arc::clone(&pending);
            tokio::spawn(async move {
                while let Some(reply) = replies.recv().await {
                    match pending.remove(&reply.request_id) {
                        Some((_, waiter)) => {
                            let _ = waiter.send(reply.result.map_err(HandleError::from));
                        }
                        None => {
                            tracing::debug!(
                                request_id = %reply.request_id,
                                "reply with no registered waiter"
                            );
                        }
                    }
                }
            })
        };

        Ok(Self {
            bridge,
            pending,
            router,
            closed: AtomicBool::new(false),
            config,
        })
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the session still accepts calls.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Close the session.
    ///
    /// Idempotent. In-flight calls resolve to [`HandleError::Closed`];
    /// background engine work already started is abandoned and its result
    /// dropped.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("closing bridge handle");
        self.bridge.teardown();
        self.router.abort();

        let waiting: Vec<RequestId> = self.pending.iter().map(|entry| *entry.key()).collect();
        for request_id in waiting {
            if let Some((_, waiter)) = self.pending.remove(&request_id) {
                let _ = waiter.send(Err(HandleError::Closed));
            }
        }
    }

    /// Subscribe to engine events (collaboration and view lifecycle).
    ///
    /// Replaces any previously attached sink.
    pub fn event_stream(&self) -> mpsc::UnboundedReceiver<BridgeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.bridge.set_event_sink(Arc::new(tx));
        rx
    }

    /// Attach a custom event sink instead of a stream.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        self.bridge.set_event_sink(sink);
    }

    /// Entry point for engine adapters raising an event.
    pub fn forward_event(&self, event: BridgeEvent) {
        self.bridge.forward_event(event);
    }

    /// Submit one operation and await its reply.
    async fn call(&self, operation: Operation) -> Result<ResponsePayload, HandleError> {
        if !self.is_open() {
            return Err(HandleError::Closed);
        }
        let request_id = RequestId::new();
        let (waiter, reply) = oneshot::channel();
        // Registered before submission: inline operations reply inside
        // submit_with_id.
        self.pending.insert(request_id, waiter);
        self.bridge.submit_with_id(request_id, operation);
        // close() may run between the open check and the insert above; its
        // pending drain would then miss this entry while the torn-down
        // bridge drops the reply. Re-check and reclaim the waiter so the
        // caller resolves instead of waiting forever.
        if !self.is_open() && self.pending.remove(&request_id).is_some() {
            return Err(HandleError::Closed);
        }
        match reply.await {
            Ok(result) => result,
            Err(_) => {
                self.pending.remove(&request_id);
                Err(HandleError::Closed)
            }
        }
    }

    // --- Forms ---

    /// Write a form field value in its string encoding.
    pub async fn set_form_field_value(&self, name: &str, value: &str) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::SetFormFieldValue {
                fully_qualified_name: name.to_string(),
                value: value.to_string(),
            })
            .await?,
        )
    }

    /// Read a form field value in its string encoding.
    pub async fn get_form_field_value(&self, name: &str) -> Result<String, HandleError> {
        expect_text(
            self.call(Operation::GetFormFieldValue {
                fully_qualified_name: name.to_string(),
            })
            .await?,
        )
    }

    // --- Annotations and document JSON ---

    /// Import a document-level JSON payload of annotation changes.
    pub async fn apply_instant_json(&self, annotations_json: &str) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::ApplyInstantJson {
                annotations_json: annotations_json.to_string(),
            })
            .await?,
        )
    }

    /// Export the document-level JSON payload of annotation changes.
    pub async fn export_instant_json(&self) -> Result<String, HandleError> {
        expect_text(self.call(Operation::ExportInstantJson).await?)
    }

    /// Create one annotation from its JSON representation.
    pub async fn add_annotation(&self, annotation_json: &str) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::AddAnnotation {
                annotation_json: annotation_json.to_string(),
            })
            .await?,
        )
    }

    /// Remove the annotation matching the given JSON representation.
    pub async fn remove_annotation(&self, annotation_json: &str) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::RemoveAnnotation {
                annotation_json: annotation_json.to_string(),
            })
            .await?,
        )
    }

    /// Enumerate annotations of one type on one page, as JSON strings.
    pub async fn get_annotations(
        &self,
        page_index: i64,
        annotation_type: &str,
    ) -> Result<Vec<String>, HandleError> {
        let annotation_type = parse_annotation_type(annotation_type)?;
        expect_list(
            self.call(Operation::GetAnnotations {
                page_index,
                annotation_type,
            })
            .await?,
        )
    }

    /// Export all not-yet-saved annotation changes as JSON.
    pub async fn get_all_unsaved_annotations(&self) -> Result<String, HandleError> {
        expect_text(self.call(Operation::GetAllUnsavedAnnotations).await?)
    }

    /// Process annotations of one type into a new file.
    pub async fn process_annotations(
        &self,
        annotation_type: &str,
        processing_mode: &str,
        destination_path: &Path,
    ) -> Result<bool, HandleError> {
        let annotation_type = parse_annotation_type(annotation_type)?;
        let processing_mode = parse_processing_mode(processing_mode)?;
        expect_bool(
            self.call(Operation::ProcessAnnotations {
                annotation_type,
                processing_mode,
                destination_path: destination_path.to_path_buf(),
            })
            .await?,
        )
    }

    // --- XFDF ---

    /// Import an XFDF payload.
    pub async fn import_xfdf(&self, xfdf: &str) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::ImportXfdf {
                xfdf: xfdf.to_string(),
            })
            .await?,
        )
    }

    /// Export annotations as XFDF to the destination path.
    pub async fn export_xfdf(&self, destination_path: &Path) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::ExportXfdf {
                destination_path: destination_path.to_path_buf(),
            })
            .await?,
        )
    }

    // --- Persistence ---

    /// Persist pending changes.
    pub async fn save(&self) -> Result<bool, HandleError> {
        expect_bool(self.call(Operation::Save).await?)
    }

    // --- Instant collaboration ---

    /// Trigger a sync cycle with the collaboration server.
    pub async fn sync_annotations(&self) -> Result<bool, HandleError> {
        expect_bool(self.call(Operation::SyncAnnotations).await?)
    }

    /// Set the delay before local changes are synced.
    pub async fn set_sync_delay(&self, seconds: f64) -> Result<bool, HandleError> {
        expect_bool(self.call(Operation::SetSyncDelay { seconds }).await?)
    }

    /// Enable or disable listening for server-side changes.
    pub async fn set_listen_to_server_changes(&self, listen: bool) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::SetListenToServerChanges { listen })
                .await?,
        )
    }

    // --- View ---

    /// Install annotation preset configurations on the view.
    pub async fn set_annotation_configurations(
        &self,
        configurations: HashMap<String, serde_json::Value>,
    ) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::SetAnnotationConfigurations { configurations })
                .await?,
        )
    }

    /// Visible rectangle of one page in PDF coordinates.
    pub async fn get_visible_rect(&self, page_index: i64) -> Result<PdfRect, HandleError> {
        expect_rect(self.call(Operation::GetVisibleRect { page_index }).await?)
    }

    /// Zoom the view to a rectangle on one page.
    pub async fn zoom_to_rect(
        &self,
        page_index: i64,
        rect: PdfRect,
        animated: bool,
        duration_seconds: Option<f64>,
    ) -> Result<bool, HandleError> {
        expect_bool(
            self.call(Operation::ZoomToRect {
                page_index,
                rect,
                animated,
                duration_seconds,
            })
            .await?,
        )
    }

    /// Current zoom scale of one page.
    pub async fn get_zoom_scale(&self, page_index: i64) -> Result<f64, HandleError> {
        expect_scalar(self.call(Operation::GetZoomScale { page_index }).await?)
    }

    // --- Document generation ---

    /// Generate a PDF from an HTML string; returns the written path.
    pub async fn generate_pdf_from_html(
        &self,
        html: &str,
        output_path: &Path,
        options: HtmlConversionOptions,
    ) -> Result<String, HandleError> {
        expect_path(
            self.call(Operation::GeneratePdfFromHtml {
                html: html.to_string(),
                output_path: output_path.to_path_buf(),
                options,
            })
            .await?,
        )
    }

    /// Generate a PDF from a page-description list; returns the written path.
    pub async fn generate_pdf(
        &self,
        pages: Vec<serde_json::Value>,
        output_path: &Path,
    ) -> Result<String, HandleError> {
        expect_path(
            self.call(Operation::GeneratePdf {
                pages,
                output_path: output_path.to_path_buf(),
            })
            .await?,
        )
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("open", &self.is_open())
            .field("pending", &self.pending.len())
            .finish()
    }
}

fn parse_annotation_type(token: &str) -> Result<AnnotationType, HandleError> {
    AnnotationType::from_name(token).ok_or_else(|| HandleError::InvalidArgument {
        message: "unknown annotation type".to_string(),
        details: format!("no annotation type named \"{token}\""),
    })
}

fn parse_processing_mode(token: &str) -> Result<AnnotationProcessingMode, HandleError> {
    AnnotationProcessingMode::from_name(token).ok_or_else(|| HandleError::InvalidArgument {
        message: "unknown processing mode".to_string(),
        details: format!("no processing mode named \"{token}\""),
    })
}

fn mismatch(expected: &str, got: ResponsePayload) -> HandleError {
    HandleError::Protocol(format!("expected {expected} payload, got {}", got.kind()))
}

fn expect_bool(payload: ResponsePayload) -> Result<bool, HandleError> {
    match payload {
        ResponsePayload::Bool(value) => Ok(value),
        other => Err(mismatch("bool", other)),
    }
}

fn expect_text(payload: ResponsePayload) -> Result<String, HandleError> {
    match payload {
        ResponsePayload::Text(value) => Ok(value),
        other => Err(mismatch("text", other)),
    }
}

fn expect_list(payload: ResponsePayload) -> Result<Vec<String>, HandleError> {
    match payload {
        ResponsePayload::JsonList(items) => Ok(items),
        other => Err(mismatch("jsonList", other)),
    }
}

fn expect_rect(payload: ResponsePayload) -> Result<PdfRect, HandleError> {
    match payload {
        ResponsePayload::Rect(rect) => Ok(rect),
        other => Err(mismatch("rect", other)),
    }
}

fn expect_scalar(payload: ResponsePayload) -> Result<f64, HandleError> {
    match payload {
        ResponsePayload::Scalar(value) => Ok(value),
        other => Err(mismatch("scalar", other)),
    }
}

fn expect_path(payload: ResponsePayload) -> Result<String, HandleError> {
    match payload {
        ResponsePayload::Path(path) => Ok(path),
        other => Err(mismatch("path", other)),
    }
}
