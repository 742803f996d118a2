//! WASM bindings for the pagecraft document tools
//!
//! All document work happens in Rust. JavaScript owns the DOM, file pickers, the
//! page viewer and the two browser-only collaborators used by Word conversion
//! (a DOCX-to-HTML converter and an HTML-to-bitmap renderer).
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { extractPages, EditSession } from './pkg/pagecraft_wasm.js';
//!
//! await init();
//!
//! const out = extractPages("report.pdf", bytes, "1-3, 5");
//! downloadBlob(out.bytes, out.filename, out.mimeType);
//!
//! const session = new EditSession("form.pdf", bytes);
//! session.setPageFrame(0, canvas.width, canvas.height, 1.5);
//! session.addText(0, 120, 80, "Approved", "Helvetica", 18, "#c00000");
//! const saved = session.save();
//! ```

pub mod edit_session;
pub mod word;

use pagecraft_core::{
    pagination, tools, DocumentProbe, EngineConfig, EngineError, LopdfBackend, Output,
    PageRange, PageSize, SourceFile,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use edit_session::EditSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    pagecraft_core::version().to_string()
}

/// A finished file ready for download.
#[wasm_bindgen]
pub struct ToolOutput {
    inner: Output,
}

#[wasm_bindgen]
impl ToolOutput {
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.inner.bytes[..])
    }

    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.inner.filename.clone()
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type.to_string()
    }
}

impl From<Output> for ToolOutput {
    fn from(inner: Output) -> Self {
        Self { inner }
    }
}

/// Log the technical detail and hand JavaScript the user-facing message.
pub(crate) fn to_js_error(err: EngineError) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&format!("pagecraft: {}", err)));
    JsValue::from_str(&err.user_message())
}

/// Configuration from an optional JSON string; absent or empty means defaults.
pub(crate) fn parse_config(json: Option<String>) -> Result<EngineConfig, EngineError> {
    match json.as_deref().map(str::trim) {
        None | Some("") => Ok(EngineConfig::default()),
        Some(json) => EngineConfig::from_json(json),
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct PdfInfo {
    page_count: usize,
    pages: Vec<PageSize>,
}

fn pdf_info(bytes: &[u8]) -> Result<PdfInfo, EngineError> {
    let info = LopdfBackend::new().probe(bytes)?;
    Ok(PdfInfo {
        page_count: info.page_count(),
        pages: info.page_sizes().to_vec(),
    })
}

/// Page count and per-page sizes in points
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pdf_info(bytes).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Validate a page range as the user types; returns the selected pages
#[wasm_bindgen(js_name = parsePageRange)]
pub fn parse_page_range(text: &str, max_page: u32) -> Result<Vec<u32>, JsValue> {
    PageRange::parse(text, max_page)
        .map(PageRange::into_vec)
        .map_err(|e| to_js_error(e.into()))
}

fn run_extract(name: &str, bytes: &[u8], range: &str) -> Result<Output, EngineError> {
    let backend = LopdfBackend::new();
    let source = SourceFile::new(name, bytes.to_vec());
    tools::extract_pages(&source, range, &backend, &backend)
}

#[wasm_bindgen(js_name = extractPages)]
pub fn extract_pages(name: &str, bytes: &[u8], range: &str) -> Result<ToolOutput, JsValue> {
    run_extract(name, bytes, range)
        .map(ToolOutput::from)
        .map_err(to_js_error)
}

fn run_number_pages(
    name: &str,
    bytes: &[u8],
    range: &str,
    config: Option<String>,
) -> Result<Output, EngineError> {
    let config = parse_config(config)?;
    let backend = LopdfBackend::new();
    let source = SourceFile::new(name, bytes.to_vec());
    tools::number_pages(&source, range, &config, &backend, &backend)
}

#[wasm_bindgen(js_name = numberPages)]
pub fn number_pages(
    name: &str,
    bytes: &[u8],
    range: &str,
    config_json: Option<String>,
) -> Result<ToolOutput, JsValue> {
    run_number_pages(name, bytes, range, config_json)
        .map(ToolOutput::from)
        .map_err(to_js_error)
}

fn run_watermark(
    name: &str,
    bytes: &[u8],
    text: &str,
    range: &str,
    config: Option<String>,
) -> Result<Output, EngineError> {
    let config = parse_config(config)?;
    let backend = LopdfBackend::new();
    let source = SourceFile::new(name, bytes.to_vec());
    tools::watermark(&source, text, range, &config, &backend, &backend)
}

#[wasm_bindgen(js_name = addWatermark)]
pub fn add_watermark(
    name: &str,
    bytes: &[u8],
    text: &str,
    range: &str,
    config_json: Option<String>,
) -> Result<ToolOutput, JsValue> {
    run_watermark(name, bytes, text, range, config_json)
        .map(ToolOutput::from)
        .map_err(to_js_error)
}

/// Which serializer a text conversion uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextFormat {
    Plain,
    Html,
}

fn run_convert_text(
    name: &str,
    bytes: &[u8],
    format: TextFormat,
    config: Option<String>,
) -> Result<Output, EngineError> {
    let config = parse_config(config)?;
    let source = SourceFile::new(name, bytes.to_vec());
    let backend = LopdfBackend::new();
    match format {
        TextFormat::Plain => tools::pdf_to_text(&source, &config, &backend),
        TextFormat::Html => tools::pdf_to_html(&source, &config, &backend),
    }
}

#[wasm_bindgen(js_name = pdfToText)]
pub fn pdf_to_text(
    name: &str,
    bytes: &[u8],
    config_json: Option<String>,
) -> Result<ToolOutput, JsValue> {
    run_convert_text(name, bytes, TextFormat::Plain, config_json)
        .map(ToolOutput::from)
        .map_err(to_js_error)
}

#[wasm_bindgen(js_name = pdfToHtml)]
pub fn pdf_to_html(
    name: &str,
    bytes: &[u8],
    config_json: Option<String>,
) -> Result<ToolOutput, JsValue> {
    run_convert_text(name, bytes, TextFormat::Html, config_json)
        .map(ToolOutput::from)
        .map_err(to_js_error)
}

/// Page placements for a rendered bitmap, for previewing a conversion
#[wasm_bindgen(js_name = previewPagination)]
pub fn preview_pagination(
    raster_width: f64,
    raster_height: f64,
    page_width: f64,
    page_height: f64,
) -> Result<JsValue, JsValue> {
    let result = pagination::paginate(
        raster_height,
        raster_width,
        page_width,
        page_height,
        &EngineConfig::default().pagination,
    )
    .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Format bytes as human-readable string
#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
