//! Edit session for the in-place PDF editor
//!
//! Wraps one `AnnotationModel` plus the source bytes. The viewer renders pages,
//! reports each rendered frame, and forwards pointer events in canvas pixels.

use crate::to_js_error;
use pagecraft_core::annotation::{ImageEdit, PointerOutcome, StrokeStyle};
use pagecraft_core::{
    tools, AnnotationModel, DocumentProbe, EngineError, LopdfBackend, Output, RasterFrame,
    SourceFile, SourceKind, TextEdit, Tool, ViewerPoint, ViewerRect,
};
use wasm_bindgen::prelude::*;

/// Session for editing a single PDF document
#[wasm_bindgen]
pub struct EditSession {
    source: SourceFile,
    model: AnnotationModel,
}

impl EditSession {
    pub(crate) fn open(name: &str, bytes: &[u8]) -> Result<Self, EngineError> {
        let source = SourceFile::new(name, bytes.to_vec());
        source.require(SourceKind::Pdf)?;
        let info = LopdfBackend::new().probe(&source.bytes)?;
        Ok(Self {
            source,
            model: AnnotationModel::new(info),
        })
    }

    pub(crate) fn model(&self) -> &AnnotationModel {
        &self.model
    }

    pub(crate) fn render_output(&self) -> Result<Output, EngineError> {
        tools::save_edits(&self.source, &self.model, &LopdfBackend::new())
    }
}

fn parse_tool(name: &str) -> Result<Tool, EngineError> {
    match name.to_ascii_lowercase().as_str() {
        "select" => Ok(Tool::Select),
        "text" => Ok(Tool::Text),
        "image" => Ok(Tool::Image),
        "draw" => Ok(Tool::Draw),
        other => Err(EngineError::PreconditionViolation(format!(
            "unknown tool '{}'",
            other
        ))),
    }
}

/// Pointer outcome as the id of a committed stroke, or -1.
fn committed_id(outcome: PointerOutcome) -> i64 {
    match outcome {
        PointerOutcome::StrokeCommitted(id) => id as i64,
        _ => -1,
    }
}

#[wasm_bindgen]
impl EditSession {
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, bytes: &[u8]) -> Result<EditSession, JsValue> {
        Self::open(name, bytes).map_err(to_js_error)
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.model.document().page_count()
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> String {
        self.source.name.clone()
    }

    /// Page size in points as `[width, height]`
    #[wasm_bindgen(js_name = pageSize)]
    pub fn page_size(&self, page_index: usize) -> Option<Vec<f64>> {
        self.model
            .document()
            .page_size(page_index)
            .map(|size| vec![size.width, size.height])
    }

    /// Record the pixel size the viewer rendered a page at.
    /// Call again whenever the page is re-rendered; edits already placed keep
    /// the frame they were made in.
    #[wasm_bindgen(js_name = setPageFrame)]
    pub fn set_page_frame(
        &mut self,
        page_index: usize,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<(), JsValue> {
        self.model
            .set_page_frame(page_index, RasterFrame::new(width, height, scale))
            .map_err(to_js_error)
    }

    /// Switch tool ("select", "text", "image", "draw").
    /// Returns the id of a stroke the switch committed, or -1.
    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) -> Result<i64, JsValue> {
        let tool = parse_tool(tool).map_err(to_js_error)?;
        Ok(self.model.set_tool(tool).map_or(-1, |id| id as i64))
    }

    #[wasm_bindgen(js_name = setStrokeStyle)]
    pub fn set_stroke_style(&mut self, color: &str, width: f64) {
        self.model.set_stroke_style(StrokeStyle {
            color: color.to_string(),
            width,
        });
    }

    /// True while a stroke is being drawn
    #[wasm_bindgen(getter, js_name = isPlacing)]
    pub fn is_placing(&self) -> bool {
        self.model.active_stroke().is_some()
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, page_index: usize, x: f64, y: f64) -> Result<i64, JsValue> {
        self.model
            .pointer_down(page_index, ViewerPoint::new(x, y))
            .map(committed_id)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.model.pointer_move(ViewerPoint::new(x, y)) == PointerOutcome::PointAppended
    }

    /// End the drag. Returns the committed stroke id, or -1 if nothing was drawn.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> i64 {
        committed_id(self.model.pointer_up())
    }

    /// Add a text box anchored at its baseline start, in canvas pixels.
    #[wasm_bindgen(js_name = addText)]
    #[allow(clippy::too_many_arguments)]
    pub fn add_text(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        text: &str,
        font_family: &str,
        size: f64,
        color: &str,
    ) -> Result<u64, JsValue> {
        let edit = TextEdit {
            position: ViewerPoint::new(x, y),
            content: text.to_string(),
            font_family: font_family.to_string(),
            size,
            color: color.to_string(),
        };
        self.model.add_text(page_index, edit).map_err(to_js_error)
    }

    /// Place a PNG or JPEG image over a canvas-pixel rectangle.
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        data: &[u8],
    ) -> Result<u64, JsValue> {
        let rect = ViewerRect {
            x,
            y,
            width,
            height,
        };
        let image = ImageEdit::from_bytes(rect, data.to_vec()).map_err(to_js_error)?;
        self.model.add_image(page_index, image).map_err(to_js_error)
    }

    /// Remove an edit by id
    pub fn remove(&mut self, id: u64) -> bool {
        self.model.remove(id)
    }

    pub fn clear(&mut self) {
        self.model.clear();
    }

    #[wasm_bindgen(js_name = hasChanges)]
    pub fn has_changes(&self) -> bool {
        !self.model.is_empty()
    }

    #[wasm_bindgen(js_name = editCount)]
    pub fn edit_count(&self) -> usize {
        self.model.edits().len()
    }

    /// All committed edits as JSON, for redrawing overlays
    #[wasm_bindgen(js_name = editsJson)]
    pub fn edits_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.model.edits())
            .map_err(|e| to_js_error(EngineError::from(e)))
    }

    /// Flatten every edit into the document. The session keeps its edits either way.
    pub fn save(&self) -> Result<crate::ToolOutput, JsValue> {
        self.render_output()
            .map(crate::ToolOutput::from)
            .map_err(to_js_error)
    }
}
