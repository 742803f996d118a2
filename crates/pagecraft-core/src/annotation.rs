//! Annotation model for the in-place editor
//!
//! Holds the user's edits in viewer space, page by page, in the order they were
//! made. Each edit keeps the raster frame its pixels refer to, so re-rendering a
//! page at another zoom does not move it. Committed edits never change. A freehand
//! stroke being drawn lives in a separate active slot and only joins the committed
//! list when the drag ends.

use crate::document::DocumentInfo;
use crate::error::{EngineError, Result};
use crate::flatten::{self, DrawInstruction};
use crate::geometry::{RasterFrame, ViewerPoint, ViewerRect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type EditId = u64;

/// Raster encodings accepted for image edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else {
            None
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Baseline start in viewer pixels.
    pub position: ViewerPoint,
    pub content: String,
    pub font_family: String,
    /// Font size in viewer pixels.
    pub size: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEdit {
    pub rect: ViewerRect,
    pub kind: ImageKind,
    #[serde(with = "crate::bytes_base64")]
    pub data: Vec<u8>,
}

impl ImageEdit {
    /// Build an image edit, detecting the encoding from the bytes.
    pub fn from_bytes(rect: ViewerRect, data: Vec<u8>) -> Result<Self> {
        let kind = ImageKind::detect(&data).ok_or_else(|| {
            EngineError::InvalidInput("image must be a PNG or JPEG file".to_string())
        })?;
        Ok(Self { rect, kind, data })
    }
}

/// Freehand polyline. Points can only be appended while the drag that owns it is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingEdit {
    points: Vec<ViewerPoint>,
    pub color: String,
    pub width: f64,
}

impl DrawingEdit {
    pub fn new(start: ViewerPoint, style: &StrokeStyle) -> Self {
        Self {
            points: vec![start],
            color: style.color.clone(),
            width: style.width,
        }
    }

    pub fn points(&self) -> &[ViewerPoint] {
        &self.points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditKind {
    Text(TextEdit),
    Image(ImageEdit),
    Drawing(DrawingEdit),
}

/// A committed edit on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    id: EditId,
    page_index: usize,
    /// Frame the page was rendered at when the edit was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame: Option<RasterFrame>,
    kind: EditKind,
}

impl Edit {
    pub fn new(id: EditId, page_index: usize, frame: Option<RasterFrame>, kind: EditKind) -> Self {
        Self {
            id,
            page_index,
            frame,
            kind,
        }
    }

    pub fn frame(&self) -> Option<RasterFrame> {
        self.frame
    }

    pub fn id(&self) -> EditId {
        self.id
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Select,
    Text,
    Image,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    Idle,
    Placing,
}

/// What a pointer event did to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    StrokeStarted,
    PointAppended,
    StrokeCommitted(EditId),
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    page_index: usize,
    frame: Option<RasterFrame>,
    stroke: DrawingEdit,
}

/// Editing session state for one open document.
#[derive(Debug, Clone)]
pub struct AnnotationModel {
    document: DocumentInfo,
    frames: BTreeMap<usize, RasterFrame>,
    edits: Vec<Edit>,
    active: Option<ActiveStroke>,
    tool: Tool,
    stroke_style: StrokeStyle,
    next_id: EditId,
}

impl AnnotationModel {
    pub fn new(document: DocumentInfo) -> Self {
        Self {
            document,
            frames: BTreeMap::new(),
            edits: Vec::new(),
            active: None,
            tool: Tool::Select,
            stroke_style: StrokeStyle::default(),
            next_id: 0,
        }
    }

    pub fn document(&self) -> &DocumentInfo {
        &self.document
    }

    /// Record the raster a page is currently rendered at.
    ///
    /// Edits made from now on are in this frame's pixels. Existing edits keep the
    /// frame they were made in.
    pub fn set_page_frame(&mut self, page_index: usize, frame: RasterFrame) -> Result<()> {
        self.document.require_page(page_index)?;
        if !(frame.width > 0.0 && frame.height > 0.0) {
            return Err(EngineError::PreconditionViolation(format!(
                "raster frame for page {} has no area",
                page_index
            )));
        }
        self.frames.insert(page_index, frame);
        Ok(())
    }

    pub fn page_frame(&self, page_index: usize) -> Option<RasterFrame> {
        self.frames.get(&page_index).copied()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. A stroke still being drawn is committed first.
    pub fn set_tool(&mut self, tool: Tool) -> Option<EditId> {
        let committed = self.finish_stroke();
        self.tool = tool;
        committed
    }

    pub fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.stroke_style = style;
    }

    pub fn state(&self) -> ToolState {
        if self.active.is_some() {
            ToolState::Placing
        } else {
            ToolState::Idle
        }
    }

    pub fn pointer_down(
        &mut self,
        page_index: usize,
        point: ViewerPoint,
    ) -> Result<PointerOutcome> {
        if self.tool != Tool::Draw {
            return Ok(PointerOutcome::Ignored);
        }
        self.document.require_page(page_index)?;

        // A missed pointer-up must not leave the previous stroke dangling.
        self.finish_stroke();

        self.active = Some(ActiveStroke {
            page_index,
            frame: self.page_frame(page_index),
            stroke: DrawingEdit::new(point, &self.stroke_style),
        });
        Ok(PointerOutcome::StrokeStarted)
    }

    pub fn pointer_move(&mut self, point: ViewerPoint) -> PointerOutcome {
        match self.active.as_mut() {
            Some(active) => {
                active.stroke.points.push(point);
                PointerOutcome::PointAppended
            }
            None => PointerOutcome::Ignored,
        }
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        match self.finish_stroke() {
            Some(id) => PointerOutcome::StrokeCommitted(id),
            None => PointerOutcome::Ignored,
        }
    }

    fn finish_stroke(&mut self) -> Option<EditId> {
        let active = self.active.take()?;
        let id = self.push(
            active.page_index,
            active.frame,
            EditKind::Drawing(active.stroke),
        );
        tracing::debug!(edit = id, page = active.page_index, "stroke committed");
        Some(id)
    }

    pub fn add_text(&mut self, page_index: usize, text: TextEdit) -> Result<EditId> {
        self.document.require_page(page_index)?;
        Ok(self.push(page_index, self.page_frame(page_index), EditKind::Text(text)))
    }

    pub fn add_image(&mut self, page_index: usize, image: ImageEdit) -> Result<EditId> {
        self.document.require_page(page_index)?;
        Ok(self.push(page_index, self.page_frame(page_index), EditKind::Image(image)))
    }

    fn push(&mut self, page_index: usize, frame: Option<RasterFrame>, kind: EditKind) -> EditId {
        let id = self.next_id;
        self.next_id += 1;
        self.edits.push(Edit::new(id, page_index, frame, kind));
        id
    }

    pub fn remove(&mut self, id: EditId) -> bool {
        if let Some(pos) = self.edits.iter().position(|e| e.id() == id) {
            self.edits.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.active = None;
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn edits_for_page(&self, page_index: usize) -> impl Iterator<Item = &Edit> {
        self.edits
            .iter()
            .filter(move |e| e.page_index() == page_index)
    }

    /// The stroke being drawn, for live preview.
    pub fn active_stroke(&self) -> Option<(usize, &DrawingEdit)> {
        self.active
            .as_ref()
            .map(|active| (active.page_index, &active.stroke))
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Flatten the committed edits into document-space draw instructions.
    pub fn commit(&self) -> Result<Vec<DrawInstruction>> {
        flatten::commit(&self.edits, &self.document)
    }
}
