//! Flatten viewer-space edits into document-space draw instructions
//!
//! The output is what the encoder consumes. It is a pure function of the edit list
//! and the document, so committing twice yields identical output.

use crate::annotation::{Edit, EditKind, ImageKind};
use crate::document::DocumentInfo;
use crate::error::{EngineError, Result};
use crate::geometry::{CoordinateMapper, DocumentPoint, DocumentRect};
use crate::style::{Rgb, StandardFont};
use serde::{Deserialize, Serialize};

/// One primitive the encoder places on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DrawInstruction {
    Text {
        page_index: usize,
        /// Baseline start.
        origin: DocumentPoint,
        content: String,
        font: StandardFont,
        size: f64,
        color: Rgb,
        opacity: f64,
        /// Counter-clockwise, in degrees, around `origin`.
        rotation: f64,
    },
    Image {
        page_index: usize,
        rect: DocumentRect,
        kind: ImageKind,
        #[serde(with = "crate::bytes_base64")]
        data: Vec<u8>,
    },
    Path {
        page_index: usize,
        points: Vec<DocumentPoint>,
        color: Rgb,
        width: f64,
    },
}

impl DrawInstruction {
    pub fn page_index(&self) -> usize {
        match self {
            DrawInstruction::Text { page_index, .. } => *page_index,
            DrawInstruction::Image { page_index, .. } => *page_index,
            DrawInstruction::Path { page_index, .. } => *page_index,
        }
    }
}

/// Map every edit into document space, page by page, keeping insertion order within a page.
///
/// Each edit is mapped with the raster frame it was made in. Fails without producing
/// anything if an edit points past the last page or was made before its page had a frame.
pub fn commit(edits: &[Edit], document: &DocumentInfo) -> Result<Vec<DrawInstruction>> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    // Stable: insertion order survives within each page.
    ordered.sort_by_key(|edit| edit.page_index());

    let instructions = ordered
        .into_iter()
        .map(|edit| {
            let page_index = edit.page_index();
            let page = document.require_page(page_index)?;
            let frame = edit.frame().ok_or_else(|| {
                EngineError::PreconditionViolation(format!(
                    "edit {} on page {} was made without a raster frame",
                    edit.id(),
                    page_index
                ))
            })?;
            Ok(flatten_edit(edit, &CoordinateMapper::new(frame, page)?))
        })
        .collect::<Result<Vec<DrawInstruction>>>()?;

    tracing::debug!(
        edits = edits.len(),
        instructions = instructions.len(),
        "flattened edits into draw instructions"
    );
    Ok(instructions)
}

fn flatten_edit(edit: &Edit, mapper: &CoordinateMapper) -> DrawInstruction {
    let page_index = edit.page_index();
    match edit.kind() {
        EditKind::Text(text) => DrawInstruction::Text {
            page_index,
            origin: mapper.to_document_space(text.position),
            content: text.content.clone(),
            font: StandardFont::resolve(&text.font_family),
            size: mapper.vertical_length(text.size),
            color: Rgb::parse(&text.color),
            opacity: 1.0,
            rotation: 0.0,
        },
        EditKind::Image(image) => DrawInstruction::Image {
            page_index,
            rect: mapper.rect_to_document_space(image.rect),
            kind: image.kind,
            data: image.data.clone(),
        },
        EditKind::Drawing(drawing) => DrawInstruction::Path {
            page_index,
            points: drawing
                .points()
                .iter()
                .map(|p| mapper.to_document_space(*p))
                .collect(),
            color: Rgb::parse(&drawing.color),
            width: mapper.length(drawing.width),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationModel, ImageEdit, StrokeStyle, TextEdit, Tool};
    use crate::geometry::{PageSize, RasterFrame, ViewerPoint, ViewerRect};
    use pretty_assertions::assert_eq;

    /// Two letter pages rendered at 2x.
    fn model() -> AnnotationModel {
        let mut model = AnnotationModel::new(DocumentInfo::uniform(2, PageSize::LETTER));
        for page in 0..2 {
            model
                .set_page_frame(page, RasterFrame::for_page(PageSize::LETTER, 2.0))
                .unwrap();
        }
        model
    }

    fn text_at(x: f64, y: f64, content: &str) -> TextEdit {
        TextEdit {
            position: ViewerPoint::new(x, y),
            content: content.to_string(),
            font_family: "serif".to_string(),
            size: 24.0,
            color: "#FF0000".to_string(),
        }
    }

    #[test]
    fn test_text_is_scaled_and_flipped() {
        let mut model = model();
        model.add_text(0, text_at(200.0, 100.0, "Hi")).unwrap();

        let instructions = model.commit().unwrap();
        assert_eq!(
            instructions,
            vec![DrawInstruction::Text {
                page_index: 0,
                origin: DocumentPoint::new(100.0, 742.0),
                content: "Hi".to_string(),
                font: StandardFont::TimesRoman,
                size: 12.0,
                color: Rgb::from_bytes(255, 0, 0),
                opacity: 1.0,
                rotation: 0.0,
            }]
        );
    }

    #[test]
    fn test_image_anchor_subtracts_height() {
        let mut model = model();
        let image = ImageEdit::from_bytes(
            ViewerRect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 100.0,
            },
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        )
        .unwrap();
        model.add_image(1, image).unwrap();

        match &model.commit().unwrap()[0] {
            DrawInstruction::Image {
                page_index, rect, ..
            } => {
                assert_eq!(*page_index, 1);
                assert_eq!(
                    *rect,
                    DocumentRect {
                        x: 0.0,
                        y: 742.0,
                        width: 100.0,
                        height: 50.0,
                    }
                );
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_stroke_vertices_are_mapped() {
        let mut model = model();
        model.set_tool(Tool::Draw);
        model.set_stroke_style(StrokeStyle {
            color: "blue".into(),
            width: 4.0,
        });
        model.pointer_down(0, ViewerPoint::new(0.0, 0.0)).unwrap();
        model.pointer_move(ViewerPoint::new(1224.0, 1584.0));
        model.pointer_up();

        match &model.commit().unwrap()[0] {
            DrawInstruction::Path {
                points,
                width,
                color,
                ..
            } => {
                assert_eq!(
                    points,
                    &vec![DocumentPoint::new(0.0, 792.0), DocumentPoint::new(612.0, 0.0)]
                );
                assert_eq!(*width, 2.0);
                assert_eq!(*color, Rgb::from_bytes(0, 0, 255));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_grouped_by_page_in_insertion_order() {
        let mut model = model();
        model.add_text(1, text_at(0.0, 0.0, "p2-a")).unwrap();
        model.add_text(0, text_at(0.0, 0.0, "p1-a")).unwrap();
        model.add_text(1, text_at(0.0, 0.0, "p2-b")).unwrap();
        model.add_text(0, text_at(0.0, 0.0, "p1-b")).unwrap();

        let contents: Vec<String> = model
            .commit()
            .unwrap()
            .into_iter()
            .map(|i| match i {
                DrawInstruction::Text { content, .. } => content,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(contents, vec!["p1-a", "p1-b", "p2-a", "p2-b"]);
    }

    #[test]
    fn test_commit_is_idempotent() {
        let mut model = model();
        model.add_text(0, text_at(10.0, 10.0, "same")).unwrap();
        model
            .add_image(
                1,
                ImageEdit::from_bytes(
                    ViewerRect {
                        x: 3.0,
                        y: 4.0,
                        width: 5.0,
                        height: 6.0,
                    },
                    vec![0xFF, 0xD8, 0xFF, 0xDB, 1, 2, 3],
                )
                .unwrap(),
            )
            .unwrap();

        let first = serde_json::to_vec(&model.commit().unwrap()).unwrap();
        let second = serde_json::to_vec(&model.commit().unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_edit_past_last_page_fails_whole_commit() {
        let frame = Some(RasterFrame::new(612.0, 792.0, 1.0));
        let edits = vec![
            Edit::new(0, 0, frame, EditKind::Text(text_at(0.0, 0.0, "ok"))),
            Edit::new(1, 5, frame, EditKind::Text(text_at(0.0, 0.0, "bad"))),
        ];
        let document = DocumentInfo::uniform(2, PageSize::LETTER);

        let result = commit(&edits, &document);
        assert!(matches!(
            result,
            Err(EngineError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_rerender_does_not_move_existing_edits() {
        let mut model = AnnotationModel::new(DocumentInfo::uniform(1, PageSize::LETTER));
        model
            .set_page_frame(0, RasterFrame::for_page(PageSize::LETTER, 1.0))
            .unwrap();
        model.add_text(0, text_at(306.0, 396.0, "kept")).unwrap();
        model
            .set_page_frame(0, RasterFrame::for_page(PageSize::LETTER, 2.0))
            .unwrap();
        model.add_text(0, text_at(306.0, 396.0, "zoomed")).unwrap();

        let placed: Vec<(DocumentPoint, f64)> = model
            .commit()
            .unwrap()
            .into_iter()
            .map(|i| match i {
                DrawInstruction::Text { origin, size, .. } => (origin, size),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            placed,
            vec![
                (DocumentPoint::new(306.0, 396.0), 24.0),
                (DocumentPoint::new(153.0, 594.0), 12.0),
            ]
        );
    }

    #[test]
    fn test_frame_set_after_edit_does_not_apply_to_it() {
        let mut model = AnnotationModel::new(DocumentInfo::uniform(1, PageSize::LETTER));
        model.add_text(0, text_at(0.0, 0.0, "early")).unwrap();
        model
            .set_page_frame(0, RasterFrame::for_page(PageSize::LETTER, 1.0))
            .unwrap();
        assert!(matches!(
            model.commit(),
            Err(EngineError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_page_without_frame_fails() {
        let mut model = AnnotationModel::new(DocumentInfo::uniform(1, PageSize::A4));
        model.add_text(0, text_at(0.0, 0.0, "x")).unwrap();
        assert!(model.commit().is_err());
    }
}
