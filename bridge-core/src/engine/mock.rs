//! Mock document engine for testing.
//!
//! Holds an in-memory document (validity flag, page count, form fields,
//! per-page annotations) and records every call for verification. Failure
//! injection and an op gate let tests exercise the bridge's error and
//! teardown paths.

use super::{DocumentEngine, EngineError};
use async_trait::async_trait;
use bridge_types::{
    AnnotationProcessingMode, AnnotationType, FormField, FormFieldState, HtmlConversionOptions,
    PdfRect,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One annotation held by the mock document.
#[derive(Debug, Clone)]
struct StoredAnnotation {
    page_index: u32,
    annotation_type: AnnotationType,
    json: String,
}

#[derive(Debug, Default)]
struct MockEngineInner {
    valid: bool,
    page_count: u32,
    instant: bool,
    form_fields: Vec<FormField>,
    annotations: Vec<StoredAnnotation>,
    applied_instant_json: Vec<String>,
    imported_xfdf: Vec<String>,
    processed: Vec<(AnnotationType, AnnotationProcessingMode, PathBuf)>,
    generated: Vec<PathBuf>,
    zoomed_to: Vec<(u32, PdfRect)>,
    zoom_scale: f64,
    visible_rect: PdfRect,
    sync_delay: Option<f64>,
    listen_to_server_changes: bool,
    sync_count: u32,
    save_count: u32,
    annotation_configurations: HashMap<String, serde_json::Value>,
    calls: Vec<&'static str>,
    fail_next: HashMap<&'static str, String>,
    hold_next: Option<Arc<Notify>>,
}

/// Mock document engine for testing.
///
/// Clones share state, so a test can keep a handle on the mock after
/// passing a clone to the bridge.
#[derive(Debug, Clone)]
pub struct MockEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a valid 10-page mock document with no form fields.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockEngineInner {
                valid: true,
                page_count: 10,
                zoom_scale: 1.0,
                visible_rect: PdfRect::new(0.0, 0.0, 612.0, 792.0),
                ..MockEngineInner::default()
            })),
        }
    }

    /// Mark the document handle valid or invalid.
    pub fn set_valid(&self, valid: bool) {
        self.inner.lock().unwrap().valid = valid;
    }

    /// Set the page count.
    pub fn set_page_count(&self, count: u32) {
        self.inner.lock().unwrap().page_count = count;
    }

    /// Mark this document as connected to a collaboration server.
    pub fn set_instant(&self, instant: bool) {
        self.inner.lock().unwrap().instant = instant;
    }

    /// Add a form field to the document.
    pub fn add_form_field(&self, field: FormField) {
        self.inner.lock().unwrap().form_fields.push(field);
    }

    /// Current state of a form field, if present.
    pub fn form_field(&self, name: &str) -> Option<FormField> {
        let inner = self.inner.lock().unwrap();
        inner
            .form_fields
            .iter()
            .find(|f| f.fully_qualified_name == name)
            .cloned()
    }

    /// Seed one annotation on a page.
    pub fn add_page_annotation(
        &self,
        page_index: u32,
        annotation_type: AnnotationType,
        json: &str,
    ) {
        self.inner.lock().unwrap().annotations.push(StoredAnnotation {
            page_index,
            annotation_type,
            json: json.to_string(),
        });
    }

    /// Cause the next call to `method` to fail with the given message.
    pub fn fail_next(&self, method: &'static str, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_next
            .insert(method, message.to_string());
    }

    /// Park the next async engine call until the returned gate is notified.
    pub fn hold_next_op(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().unwrap().hold_next = Some(Arc::clone(&gate));
        gate
    }

    /// Names of every engine method invoked so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// How many times `method` was invoked.
    pub fn call_count(&self, method: &'static str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().filter(|m| **m == method).count()
    }

    /// Payloads passed to `apply_instant_json`.
    pub fn applied_instant_json(&self) -> Vec<String> {
        self.inner.lock().unwrap().applied_instant_json.clone()
    }

    /// XFDF payloads passed to `import_xfdf`.
    pub fn imported_xfdf(&self) -> Vec<String> {
        self.inner.lock().unwrap().imported_xfdf.clone()
    }

    /// Number of completed `save` calls.
    pub fn save_count(&self) -> u32 {
        self.inner.lock().unwrap().save_count
    }

    /// Number of completed `sync_annotations` calls.
    pub fn sync_count(&self) -> u32 {
        self.inner.lock().unwrap().sync_count
    }

    /// Rectangles the view was zoomed to, with their page index.
    pub fn zoomed_to(&self) -> Vec<(u32, PdfRect)> {
        self.inner.lock().unwrap().zoomed_to.clone()
    }

    /// Process invocations recorded so far.
    pub fn processed(&self) -> Vec<(AnnotationType, AnnotationProcessingMode, PathBuf)> {
        self.inner.lock().unwrap().processed.clone()
    }

    /// Record the call and consume any injected failure for `method`.
    fn begin(&self, method: &'static str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(method);
        match inner.fail_next.remove(method) {
            Some(message) => Err(EngineError::Failure(message)),
            None => Ok(()),
        }
    }

    /// Wait on the op gate, if one was armed. Lock is not held across await.
    async fn gate(&self) {
        let gate = self.inner.lock().unwrap().hold_next.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn document_json(&self) -> String {
        let inner = self.inner.lock().unwrap();
        let annotations: Vec<serde_json::Value> = inner
            .annotations
            .iter()
            .map(|a| {
                serde_json::from_str(&a.json)
                    .unwrap_or_else(|_| serde_json::Value::String(a.json.clone()))
            })
            .collect();
        serde_json::json!({
            "format": "document-json/v1",
            "annotations": annotations,
        })
        .to_string()
    }
}

fn annotation_type_from_json(value: &serde_json::Value) -> AnnotationType {
    value
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(|s| AnnotationType::from_name(s.rsplit('/').next().unwrap_or(s)))
        .unwrap_or(AnnotationType::Stamp)
}

#[async_trait]
impl DocumentEngine for MockEngine {
    fn is_valid(&self) -> bool {
        self.inner.lock().unwrap().valid
    }

    fn page_count(&self) -> u32 {
        self.inner.lock().unwrap().page_count
    }

    fn supports_instant_sync(&self) -> bool {
        self.inner.lock().unwrap().instant
    }

    fn visible_rect(&self, _page_index: u32) -> Result<PdfRect, EngineError> {
        self.begin("visible_rect")?;
        Ok(self.inner.lock().unwrap().visible_rect)
    }

    fn zoom_to_rect(
        &self,
        page_index: u32,
        rect: PdfRect,
        _animated: bool,
        _duration_seconds: Option<f64>,
    ) -> Result<(), EngineError> {
        self.begin("zoom_to_rect")?;
        self.inner.lock().unwrap().zoomed_to.push((page_index, rect));
        Ok(())
    }

    fn zoom_scale(&self, _page_index: u32) -> Result<f64, EngineError> {
        self.begin("zoom_scale")?;
        Ok(self.inner.lock().unwrap().zoom_scale)
    }

    fn sync_annotations(&self) -> Result<(), EngineError> {
        self.begin("sync_annotations")?;
        self.inner.lock().unwrap().sync_count += 1;
        Ok(())
    }

    fn set_sync_delay(&self, seconds: f64) -> Result<(), EngineError> {
        self.begin("set_sync_delay")?;
        self.inner.lock().unwrap().sync_delay = Some(seconds);
        Ok(())
    }

    fn set_listen_to_server_changes(&self, listen: bool) -> Result<(), EngineError> {
        self.begin("set_listen_to_server_changes")?;
        self.inner.lock().unwrap().listen_to_server_changes = listen;
        Ok(())
    }

    fn set_annotation_configurations(
        &self,
        configurations: HashMap<String, serde_json::Value>,
    ) -> Result<(), EngineError> {
        self.begin("set_annotation_configurations")?;
        self.inner.lock().unwrap().annotation_configurations = configurations;
        Ok(())
    }

    async fn find_form_field(
        &self,
        fully_qualified_name: &str,
    ) -> Result<Option<FormField>, EngineError> {
        self.gate().await;
        self.begin("find_form_field")?;
        Ok(self.form_field(fully_qualified_name))
    }

    async fn set_form_field_state(
        &self,
        fully_qualified_name: &str,
        state: FormFieldState,
    ) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("set_form_field_state")?;
        let mut inner = self.inner.lock().unwrap();
        let field = inner
            .form_fields
            .iter_mut()
            .find(|f| f.fully_qualified_name == fully_qualified_name)
            .ok_or_else(|| {
                EngineError::failure(format!("no form field named {fully_qualified_name}"))
            })?;
        field.state = state;
        Ok(())
    }

    async fn apply_instant_json(&self, json: &str) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("apply_instant_json")?;
        let _: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EngineError::failure(format!("invalid document JSON: {e}")))?;
        self.inner
            .lock()
            .unwrap()
            .applied_instant_json
            .push(json.to_string());
        Ok(())
    }

    async fn export_instant_json(&self) -> Result<String, EngineError> {
        self.gate().await;
        self.begin("export_instant_json")?;
        Ok(self.document_json())
    }

    async fn add_annotation(&self, json: &str) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("add_annotation")?;
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EngineError::failure(format!("invalid annotation JSON: {e}")))?;
        let page_index = value.get("pageIndex").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        let annotation_type = annotation_type_from_json(&value);
        self.inner.lock().unwrap().annotations.push(StoredAnnotation {
            page_index,
            annotation_type,
            json: json.to_string(),
        });
        Ok(())
    }

    async fn remove_annotation(&self, json: &str) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("remove_annotation")?;
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EngineError::failure(format!("invalid annotation JSON: {e}")))?;
        let name = value.get("name").and_then(|v| v.as_str());
        let mut inner = self.inner.lock().unwrap();
        let position = inner.annotations.iter().position(|a| {
            if let Some(name) = name {
                serde_json::from_str::<serde_json::Value>(&a.json)
                    .ok()
                    .and_then(|v| v.get("name").and_then(|n| n.as_str().map(String::from)))
                    .as_deref()
                    == Some(name)
            } else {
                a.json == json
            }
        });
        match position {
            Some(i) => {
                inner.annotations.remove(i);
                Ok(())
            }
            None => Err(EngineError::failure("annotation not found")),
        }
    }

    async fn annotations_on_page(
        &self,
        page_index: u32,
        annotation_type: AnnotationType,
    ) -> Result<Vec<String>, EngineError> {
        self.gate().await;
        self.begin("annotations_on_page")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .annotations
            .iter()
            .filter(|a| a.page_index == page_index && annotation_type.matches(a.annotation_type))
            .map(|a| a.json.clone())
            .collect())
    }

    async fn unsaved_annotations_json(&self) -> Result<String, EngineError> {
        self.gate().await;
        self.begin("unsaved_annotations_json")?;
        Ok(self.document_json())
    }

    async fn process_annotations(
        &self,
        annotation_type: AnnotationType,
        mode: AnnotationProcessingMode,
        destination: &Path,
    ) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("process_annotations")?;
        std::fs::write(destination, b"%PDF-1.7\n% processed by mock engine\n")
            .map_err(|e| EngineError::failure(format!("cannot write {}: {e}", destination.display())))?;
        self.inner
            .lock()
            .unwrap()
            .processed
            .push((annotation_type, mode, destination.to_path_buf()));
        Ok(())
    }

    async fn import_xfdf(&self, xfdf: &str) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("import_xfdf")?;
        if !xfdf.contains("<xfdf") {
            return Err(EngineError::failure("malformed XFDF payload"));
        }
        self.inner.lock().unwrap().imported_xfdf.push(xfdf.to_string());
        Ok(())
    }

    async fn export_xfdf(&self, destination: &Path) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("export_xfdf")?;
        let body = {
            let inner = self.inner.lock().unwrap();
            let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xfdf>\n");
            for annotation in &inner.annotations {
                body.push_str("  <annotation type=\"");
                body.push_str(annotation.annotation_type.name());
                body.push_str("\"/>\n");
            }
            body.push_str("</xfdf>\n");
            body
        };
        std::fs::write(destination, body)
            .map_err(|e| EngineError::failure(format!("cannot write {}: {e}", destination.display())))
    }

    async fn save(&self) -> Result<(), EngineError> {
        self.gate().await;
        self.begin("save")?;
        self.inner.lock().unwrap().save_count += 1;
        Ok(())
    }

    async fn generate_pdf_from_html(
        &self,
        _html: &str,
        destination: &Path,
        options: &HtmlConversionOptions,
    ) -> Result<String, EngineError> {
        self.gate().await;
        self.begin("generate_pdf_from_html")?;
        let title = options.document_title.as_deref().unwrap_or("");
        std::fs::write(destination, format!("%PDF-1.7\n% title: {title}\n"))
            .map_err(|e| EngineError::failure(format!("cannot write {}: {e}", destination.display())))?;
        self.inner.lock().unwrap().generated.push(destination.to_path_buf());
        Ok(destination.display().to_string())
    }

    async fn generate_pdf(
        &self,
        pages: &[serde_json::Value],
        destination: &Path,
    ) -> Result<String, EngineError> {
        self.gate().await;
        self.begin("generate_pdf")?;
        std::fs::write(destination, format!("%PDF-1.7\n% pages: {}\n", pages.len()))
            .map_err(|e| EngineError::failure(format!("cannot write {}: {e}", destination.display())))?;
        self.inner.lock().unwrap().generated.push(destination.to_path_buf());
        Ok(destination.display().to_string())
    }
}
