//! Coordinate transformation between viewer and document space
//!
//! Viewer space is the pixel grid of a rendered page (top-left origin, y down).
//! Document space is the page description (bottom-left origin, y up, points).

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Visible page box in document units (points).
///
/// `origin_x`/`origin_y` are the lower-left corner of the MediaBox, which is not
/// always `(0, 0)` for cropped or imposed pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    pub const A4: PageSize = PageSize::new(595.28, 841.89);

    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Upper edge of the page box.
    pub fn top(&self) -> f64 {
        self.origin_y + self.height
    }
}

/// One rendered bitmap of a page: pixel dimensions and the scale it was rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterFrame {
    pub width: f64,
    pub height: f64,
    /// Nominal pixels per document unit requested from the renderer.
    pub scale: f64,
}

impl RasterFrame {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Frame a renderer would produce for `page` at `scale`, rounded to whole pixels.
    pub fn for_page(page: PageSize, scale: f64) -> Self {
        Self {
            width: (page.width * scale).round(),
            height: (page.height * scale).round(),
            scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewerPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentPoint {
    pub x: f64,
    pub y: f64,
}

impl DocumentPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle in viewer space anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in document space anchored at its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps between the viewer space of one raster frame and its page.
///
/// The two axes get separate scale factors because the raster is rounded to whole
/// pixels and may be rendered at a different resolution than requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale_x: f64,
    scale_y: f64,
    page: PageSize,
}

impl CoordinateMapper {
    pub fn new(frame: RasterFrame, page: PageSize) -> Result<Self> {
        if !(frame.width > 0.0 && frame.height > 0.0) {
            return Err(EngineError::PreconditionViolation(format!(
                "raster frame must have a positive size, got {}x{}",
                frame.width, frame.height
            )));
        }
        if !(page.width > 0.0 && page.height > 0.0) {
            return Err(EngineError::PreconditionViolation(format!(
                "page must have a positive size, got {}x{}",
                page.width, page.height
            )));
        }

        Ok(Self {
            scale_x: page.width / frame.width,
            scale_y: page.height / frame.height,
            page,
        })
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Point-like anchors: text baselines and stroke vertices.
    pub fn to_document_space(&self, point: ViewerPoint) -> DocumentPoint {
        DocumentPoint {
            x: self.page.origin_x + point.x * self.scale_x,
            y: self.page.top() - point.y * self.scale_y,
        }
    }

    pub fn to_viewer_space(&self, point: DocumentPoint) -> ViewerPoint {
        ViewerPoint {
            x: (point.x - self.page.origin_x) / self.scale_x,
            y: (self.page.top() - point.y) / self.scale_y,
        }
    }

    /// Top-left anchored rectangle to a bottom-left anchored one.
    pub fn rect_to_document_space(&self, rect: ViewerRect) -> DocumentRect {
        let height = rect.height * self.scale_y;
        DocumentRect {
            x: self.page.origin_x + rect.x * self.scale_x,
            y: self.page.top() - rect.y * self.scale_y - height,
            width: rect.width * self.scale_x,
            height,
        }
    }

    /// Vertical lengths such as font sizes.
    pub fn vertical_length(&self, length: f64) -> f64 {
        length * self.scale_y
    }

    /// Lengths without a direction, such as stroke widths.
    pub fn length(&self, length: f64) -> f64 {
        length * (self.scale_x + self.scale_y) / 2.0
    }
}

/// Convert one viewer-space point to document space.
pub fn to_document_space(
    point: ViewerPoint,
    frame: RasterFrame,
    page: PageSize,
) -> Result<DocumentPoint> {
    Ok(CoordinateMapper::new(frame, page)?.to_document_space(point))
}

/// Convert one document-space point to viewer space.
pub fn to_viewer_space(
    point: DocumentPoint,
    frame: RasterFrame,
    page: PageSize,
) -> Result<ViewerPoint> {
    Ok(CoordinateMapper::new(frame, page)?.to_viewer_space(point))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn percentage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    proptest! {
        /// Viewer -> document -> viewer returns the original point.
        #[test]
        fn roundtrip_viewer_to_document_to_viewer(
            frame_w in dimension(),
            frame_h in dimension(),
            page_w in dimension(),
            page_h in dimension(),
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let frame = RasterFrame::new(frame_w, frame_h, 1.0);
            let page = PageSize::new(page_w, page_h);
            let p = ViewerPoint::new(x_pct * frame_w, y_pct * frame_h);

            let doc = to_document_space(p, frame, page).unwrap();
            let back = to_viewer_space(doc, frame, page).unwrap();

            let tolerance = 0.0001;
            prop_assert!(
                (back.x - p.x).abs() < tolerance,
                "X roundtrip failed: {} -> {} -> {}", p.x, doc.x, back.x
            );
            prop_assert!(
                (back.y - p.y).abs() < tolerance,
                "Y roundtrip failed: {} -> {} -> {}", p.y, doc.y, back.y
            );
        }

        /// Document -> viewer -> document returns the original point.
        #[test]
        fn roundtrip_document_to_viewer_to_document(
            frame_w in dimension(),
            frame_h in dimension(),
            page_w in dimension(),
            page_h in dimension(),
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let mapper = CoordinateMapper::new(
                RasterFrame::new(frame_w, frame_h, 1.0),
                PageSize::new(page_w, page_h),
            ).unwrap();
            let p = DocumentPoint::new(x_pct * page_w, y_pct * page_h);
            let back = mapper.to_document_space(mapper.to_viewer_space(p));

            prop_assert!((back.x - p.x).abs() < 0.0001);
            prop_assert!((back.y - p.y).abs() < 0.0001);
        }

        /// The same relative position maps to the same document point at any zoom.
        #[test]
        fn zoom_preserves_relative_positions(
            page_w in dimension(),
            page_h in dimension(),
            scale in 0.5f64..3.0,
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let page = PageSize::new(page_w, page_h);
            let unscaled =
                CoordinateMapper::new(RasterFrame::new(page_w, page_h, 1.0), page).unwrap();
            let scaled = CoordinateMapper::new(
                RasterFrame::new(page_w * scale, page_h * scale, scale),
                page,
            ).unwrap();

            let a = unscaled.to_document_space(ViewerPoint::new(x_pct * page_w, y_pct * page_h));
            let b = scaled.to_document_space(ViewerPoint::new(
                x_pct * page_w * scale,
                y_pct * page_h * scale,
            ));

            prop_assert!((a.x - b.x).abs() < 0.0001);
            prop_assert!((a.y - b.y).abs() < 0.0001);
        }

        /// Moving down in the viewer moves down (decreasing y) in the document.
        #[test]
        fn y_axis_movement_direction(
            frame_w in dimension(),
            frame_h in dimension(),
            page_w in dimension(),
            page_h in dimension(),
            y1_pct in 0.0f64..0.5,
        ) {
            let mapper = CoordinateMapper::new(
                RasterFrame::new(frame_w, frame_h, 1.0),
                PageSize::new(page_w, page_h),
            ).unwrap();
            let upper = mapper.to_document_space(ViewerPoint::new(0.0, y1_pct * frame_h));
            let lower = mapper.to_document_space(ViewerPoint::new(0.0, (y1_pct + 0.1) * frame_h));
            prop_assert!(lower.y < upper.y);
        }

        /// A rectangle's document-space top edge is the mapped viewer top edge.
        #[test]
        fn rect_top_edge_matches_point_mapping(
            frame_w in dimension(),
            frame_h in dimension(),
            page_w in dimension(),
            page_h in dimension(),
            x_pct in percentage(),
            y_pct in percentage(),
            h_pct in percentage(),
        ) {
            let mapper = CoordinateMapper::new(
                RasterFrame::new(frame_w, frame_h, 1.0),
                PageSize::new(page_w, page_h),
            ).unwrap();
            let rect = ViewerRect {
                x: x_pct * frame_w,
                y: y_pct * frame_h,
                width: 10.0,
                height: h_pct * frame_h,
            };
            let doc = mapper.rect_to_document_space(rect);
            let top = mapper.to_document_space(ViewerPoint::new(rect.x, rect.y));
            prop_assert!((doc.y + doc.height - top.y).abs() < 0.0001);
        }
    }
}
