//! PDF collaborators backed by lopdf
//!
//! One stateless backend implements probing, glyph extraction and encoding.

mod encoder;
mod extractor;
pub(crate) mod images;
mod probe;
#[cfg(test)]
pub(crate) mod test_pdf;

pub use extractor::extract_glyph_runs;
pub use probe::probe_document;

use crate::collaborators::{DocumentProbe, Encoded, Encoder, GlyphExtractor};
use crate::document::DocumentInfo;
use crate::error::{EngineError, Result};
use crate::flatten::DrawInstruction;
use crate::layout::GlyphRun;
use crate::page_range::PageRange;
use crate::pagination::Pagination;
use lopdf::{Document, Object};

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentProbe for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn probe(&self, source: &[u8]) -> Result<DocumentInfo> {
        probe_document(source)
    }
}

impl GlyphExtractor for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, source: &[u8]) -> Result<Vec<Vec<GlyphRun>>> {
        extract_glyph_runs(source)
    }
}

impl Encoder for LopdfBackend {
    fn annotate(&self, source: &[u8], instructions: &[DrawInstruction]) -> Result<Encoded> {
        encoder::annotate(source, instructions)
    }

    fn paginate_raster(&self, png: &[u8], pagination: &Pagination) -> Result<Encoded> {
        encoder::paginate_raster(png, pagination)
    }

    fn extract_pages(&self, source: &[u8], pages: &PageRange) -> Result<Encoded> {
        encoder::extract_pages(source, pages)
    }
}

/// Parse a source document, refusing encrypted files.
pub(crate) fn load(source: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(source)
        .map_err(|e| EngineError::CorruptOrProtected(format!("cannot parse document: {}", e)))?;
    if doc.is_encrypted() {
        return Err(EngineError::CorruptOrProtected(
            "document is password protected".into(),
        ));
    }
    Ok(doc)
}

pub(crate) fn save(mut doc: Document) -> Result<Encoded> {
    let page_count = doc.get_pages().len();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| EngineError::RenderFailure(format!("Save failed: {}", e)))?;
    Ok(Encoded { bytes, page_count })
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}
