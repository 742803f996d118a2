//! User-facing tools
//!
//! Each tool validates its input, runs the core algorithms against the injected
//! collaborators and returns one finished [`Output`]. Nothing is written on failure.

use crate::annotation::AnnotationModel;
use crate::collaborators::{
    DocumentProbe, Encoder, GlyphExtractor, MarkupConverter, MarkupRenderer, RenderSurface,
};
use crate::config::EngineConfig;
use crate::document::{DocumentInfo, Output, SourceFile, SourceKind};
use crate::error::{EngineError, Result};
use crate::geometry::PageSize;
use crate::layout::{LayoutReconstructor, PageText};
use crate::page_range::PageRange;
use crate::pagination::paginate;
use crate::serialize::{to_html, to_plain_text};
use crate::stamp;

/// Parse `range_text` against the source's page count.
fn resolve_range(
    source: &SourceFile,
    range_text: &str,
    probe: &impl DocumentProbe,
) -> Result<(DocumentInfo, PageRange)> {
    let info = probe.probe(&source.bytes)?;
    let max_page = u32::try_from(info.page_count()).map_err(|_| {
        EngineError::InvalidInput(format!("{} pages is too many", info.page_count()))
    })?;
    let range = PageRange::parse(range_text, max_page)?;
    Ok((info, range))
}

/// New document holding only the selected pages, in ascending order.
pub fn extract_pages(
    source: &SourceFile,
    range_text: &str,
    probe: &impl DocumentProbe,
    encoder: &impl Encoder,
) -> Result<Output> {
    source.require(SourceKind::Pdf)?;
    let (_, range) = resolve_range(source, range_text, probe)?;

    let encoded = encoder.extract_pages(&source.bytes, &range)?;
    let output = Output::new(
        encoded.bytes,
        Output::PDF,
        format!("{}_pages.pdf", source.stem()),
    );
    tracing::info!(pages = encoded.page_count, file = %output.filename, "extracted pages");
    Ok(output)
}

/// Flatten the session's edits into the source document.
pub fn save_edits(
    source: &SourceFile,
    model: &AnnotationModel,
    encoder: &impl Encoder,
) -> Result<Output> {
    source.require(SourceKind::Pdf)?;
    let instructions = model.commit()?;

    let encoded = encoder.annotate(&source.bytes, &instructions)?;
    let output = Output::new(
        encoded.bytes,
        Output::PDF,
        format!("{}_edited.pdf", source.stem()),
    );
    tracing::info!(
        edits = instructions.len(),
        file = %output.filename,
        "saved edits"
    );
    Ok(output)
}

/// Stamp page numbers on the selected pages.
pub fn number_pages(
    source: &SourceFile,
    range_text: &str,
    config: &EngineConfig,
    probe: &impl DocumentProbe,
    encoder: &impl Encoder,
) -> Result<Output> {
    source.require(SourceKind::Pdf)?;
    let (info, range) = resolve_range(source, range_text, probe)?;

    let instructions = stamp::page_numbers(&info, &range, &config.stamp)?;
    let encoded = encoder.annotate(&source.bytes, &instructions)?;
    let output = Output::new(
        encoded.bytes,
        Output::PDF,
        format!("{}_numbered.pdf", source.stem()),
    );
    tracing::info!(pages = range.len(), file = %output.filename, "numbered pages");
    Ok(output)
}

/// Draw a translucent text watermark across the selected pages.
pub fn watermark(
    source: &SourceFile,
    text: &str,
    range_text: &str,
    config: &EngineConfig,
    probe: &impl DocumentProbe,
    encoder: &impl Encoder,
) -> Result<Output> {
    source.require(SourceKind::Pdf)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(EngineError::InvalidInput("watermark text is empty".into()));
    }
    let (info, range) = resolve_range(source, range_text, probe)?;

    let instructions = stamp::watermark(&info, &range, text, &config.stamp)?;
    let encoded = encoder.annotate(&source.bytes, &instructions)?;
    let output = Output::new(
        encoded.bytes,
        Output::PDF,
        format!("{}_watermarked.pdf", source.stem()),
    );
    tracing::info!(pages = range.len(), file = %output.filename, "watermarked pages");
    Ok(output)
}

/// Render a word-processor file to one tall bitmap and slice it across pages.
pub fn word_to_pdf<R: MarkupRenderer>(
    source: &SourceFile,
    page: PageSize,
    render_width_px: u32,
    config: &EngineConfig,
    converter: &impl MarkupConverter,
    renderer: &R,
    encoder: &impl Encoder,
) -> Result<Output> {
    source.require(SourceKind::Docx)?;
    if render_width_px == 0 {
        return Err(EngineError::PreconditionViolation(
            "render width must be positive".into(),
        ));
    }

    let markup = converter.convert(&source.bytes)?;
    // Released when this scope ends, whether encoding succeeds or not.
    let surface = renderer.render(&markup, render_width_px)?;

    let pagination = paginate(
        f64::from(surface.height()),
        f64::from(surface.width()),
        page.width,
        page.height,
        &config.pagination,
    )?;
    let encoded = encoder.paginate_raster(surface.png(), &pagination)?;
    drop(surface);

    let output = Output::new(encoded.bytes, Output::PDF, format!("{}.pdf", source.stem()));
    tracing::info!(pages = encoded.page_count, file = %output.filename, "converted document");
    Ok(output)
}

fn reconstruct(
    source: &SourceFile,
    config: &EngineConfig,
    extractor: &impl GlyphExtractor,
) -> Result<Vec<PageText>> {
    source.require(SourceKind::Pdf)?;
    let runs = extractor.extract(&source.bytes)?;
    Ok(LayoutReconstructor::new(config.layout.clone()).reconstruct(&runs))
}

/// Plain text with paragraphs and page breaks recovered from glyph positions.
pub fn pdf_to_text(
    source: &SourceFile,
    config: &EngineConfig,
    extractor: &impl GlyphExtractor,
) -> Result<Output> {
    let pages = reconstruct(source, config, extractor)?;
    let output = Output::new(
        to_plain_text(&pages).into_bytes(),
        Output::TEXT,
        format!("{}.txt", source.stem()),
    );
    tracing::info!(pages = pages.len(), file = %output.filename, "converted to text");
    Ok(output)
}

/// Standalone HTML with one paragraph element per recovered paragraph.
pub fn pdf_to_html(
    source: &SourceFile,
    config: &EngineConfig,
    extractor: &impl GlyphExtractor,
) -> Result<Output> {
    let pages = reconstruct(source, config, extractor)?;
    let output = Output::new(
        to_html(&pages, source.stem()).into_bytes(),
        Output::HTML,
        format!("{}.html", source.stem()),
    );
    tracing::info!(pages = pages.len(), file = %output.filename, "converted to HTML");
    Ok(output)
}
