//! Word-to-PDF through browser-side converter and renderer
//!
//! The host supplies two async callbacks: one turning DOCX bytes into HTML, one
//! rendering HTML at a fixed pixel width into a PNG. Both are awaited up front;
//! the results then drive the synchronous pipeline through the collaborator traits.

use crate::{parse_config, to_js_error, ToolOutput};
use js_sys::{Function, Promise, Reflect, Uint8Array};
use pagecraft_core::{
    tools, EngineError, LopdfBackend, MarkupConverter, MarkupRenderer, PageSize, RenderSurface,
    Result, SourceFile,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// HTML the host already produced from the DOCX bytes.
pub(crate) struct HostMarkup(pub String);

impl MarkupConverter for HostMarkup {
    fn convert(&self, _source: &[u8]) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(EngineError::RenderFailure(
                "the document converted to empty markup".into(),
            ));
        }
        Ok(self.0.clone())
    }
}

/// A bitmap the host rendered.
pub(crate) struct HostRaster {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

pub(crate) struct HostSurface<'a> {
    raster: &'a HostRaster,
}

impl RenderSurface for HostSurface<'_> {
    fn width(&self) -> u32 {
        self.raster.width
    }

    fn height(&self) -> u32 {
        self.raster.height
    }

    fn png(&self) -> &[u8] {
        &self.raster.png
    }
}

/// Renderer over a host raster borrowed for the call.
pub(crate) struct HostRenderer<'a>(pub &'a HostRaster);

impl<'a> MarkupRenderer for HostRenderer<'a> {
    type Surface = HostSurface<'a>;

    fn render(&self, _markup: &str, width_px: u32) -> Result<HostSurface<'a>> {
        let raster = self.0;
        if raster.width != width_px {
            return Err(EngineError::RenderFailure(format!(
                "renderer produced {}px wide output, expected {}px",
                raster.width, width_px
            )));
        }
        if raster.height == 0 {
            return Err(EngineError::RenderFailure(
                "renderer produced an empty bitmap".into(),
            ));
        }
        Ok(HostSurface { raster })
    }
}

pub(crate) fn convert_prepared(
    source: &SourceFile,
    markup: HostMarkup,
    raster: &HostRaster,
    page: PageSize,
    config_json: Option<String>,
) -> Result<pagecraft_core::Output> {
    let config = parse_config(config_json)?;
    tools::word_to_pdf(
        source,
        page,
        raster.width,
        &config,
        &markup,
        &HostRenderer(raster),
        &LopdfBackend::new(),
    )
}

async fn await_callback(
    callback: &Function,
    arg: &JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let value = callback.call1(&JsValue::NULL, arg)?;
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

fn render_failure(context: &str, err: JsValue) -> JsValue {
    to_js_error(EngineError::RenderFailure(format!("{}: {:?}", context, err)))
}

/// Convert a DOCX file to PDF.
///
/// `convert(bytes) -> Promise<string>` returns HTML; `render({ html, width })`
/// returns `Promise<{ png: Uint8Array, width, height }>`.
#[wasm_bindgen(js_name = wordToPdf)]
#[allow(clippy::too_many_arguments)]
pub async fn word_to_pdf(
    name: String,
    bytes: Vec<u8>,
    page_width: f64,
    page_height: f64,
    render_width_px: u32,
    convert: Function,
    render: Function,
    config_json: Option<String>,
) -> std::result::Result<ToolOutput, JsValue> {
    let source = SourceFile::new(name, bytes);
    source
        .require(pagecraft_core::SourceKind::Docx)
        .map_err(to_js_error)?;

    let html = await_callback(&convert, &Uint8Array::from(&source.bytes[..]).into())
        .await
        .map_err(|e| render_failure("document conversion failed", e))?
        .as_string()
        .ok_or_else(|| {
            to_js_error(EngineError::RenderFailure(
                "converter did not return text".into(),
            ))
        })?;

    let request = js_sys::Object::new();
    Reflect::set(&request, &"html".into(), &JsValue::from_str(&html))?;
    Reflect::set(&request, &"width".into(), &JsValue::from(render_width_px))?;
    let rendered = await_callback(&render, &request.into())
        .await
        .map_err(|e| render_failure("rendering failed", e))?;

    let raster = HostRaster {
        png: Reflect::get(&rendered, &"png".into())?
            .dyn_into::<Uint8Array>()
            .map_err(|e| render_failure("renderer returned no PNG", e))?
            .to_vec(),
        width: Reflect::get(&rendered, &"width".into())?
            .as_f64()
            .unwrap_or(0.0) as u32,
        height: Reflect::get(&rendered, &"height".into())?
            .as_f64()
            .unwrap_or(0.0) as u32,
    };

    convert_prepared(
        &source,
        HostMarkup(html),
        &raster,
        PageSize::new(page_width, page_height),
        config_json,
    )
    .map(ToolOutput::from)
    .map_err(to_js_error)
}
