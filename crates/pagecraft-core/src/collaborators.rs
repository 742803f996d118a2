//! Seams to the rendering, parsing and encoding backends
//!
//! The tool pipelines only talk to these traits. `lopdf_backend` provides the PDF
//! implementations; the markup converter and renderer are supplied by the host.

use crate::document::DocumentInfo;
use crate::error::Result;
use crate::flatten::DrawInstruction;
use crate::layout::GlyphRun;
use crate::page_range::PageRange;
use crate::pagination::Pagination;

/// Reads page count and page sizes from a source document.
pub trait DocumentProbe {
    fn name(&self) -> &'static str;

    /// Fails with `CorruptOrProtected` when the document cannot be opened.
    fn probe(&self, source: &[u8]) -> Result<DocumentInfo>;
}

/// Positioned text fragments for every page of a source document.
pub trait GlyphExtractor {
    fn name(&self) -> &'static str;

    /// `result[i]` holds the runs of page `i`; a page without text yields an empty list.
    fn extract(&self, source: &[u8]) -> Result<Vec<Vec<GlyphRun>>>;
}

/// Converts a word-processor file into markup the renderer understands.
pub trait MarkupConverter {
    fn convert(&self, source: &[u8]) -> Result<String>;
}

/// A tall bitmap produced by rendering markup.
///
/// Implementations release whatever backs the bitmap (an offscreen element, a
/// canvas) when dropped, so the surface is freed on every exit path.
pub trait RenderSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// The bitmap encoded as PNG.
    fn png(&self) -> &[u8];
}

/// Lays markup out at a fixed pixel width and rasterizes it.
pub trait MarkupRenderer {
    type Surface: RenderSurface;

    fn render(&self, markup: &str, width_px: u32) -> Result<Self::Surface>;
}

/// Encoded document bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Writes output documents.
pub trait Encoder {
    /// Copy of `source` with the instructions drawn on top of the existing pages.
    fn annotate(&self, source: &[u8], instructions: &[DrawInstruction]) -> Result<Encoded>;

    /// New document of `pagination.page_count()` pages, each showing its window of the raster.
    fn paginate_raster(&self, png: &[u8], pagination: &Pagination) -> Result<Encoded>;

    /// New document holding only `pages` of `source`, in ascending order.
    fn extract_pages(&self, source: &[u8], pages: &PageRange) -> Result<Encoded>;
}
