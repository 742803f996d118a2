//! Page numbers and watermarks expressed as draw instructions
//!
//! Stamps are built directly in document space and go through the same encoder as
//! user edits.

use crate::config::{StampOptions, StampPosition};
use crate::document::DocumentInfo;
use crate::error::Result;
use crate::flatten::DrawInstruction;
use crate::geometry::{DocumentPoint, PageSize};
use crate::page_range::PageRange;
use crate::style::{Rgb, StandardFont};

/// Average advance of the standard fonts, in ems. Good enough to centre short labels.
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;

/// Cap height of the standard fonts, in ems.
const CAP_HEIGHT: f64 = 0.7;

pub fn estimate_text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * AVERAGE_GLYPH_WIDTH
}

/// Expand `{n}` and `{total}` in a page number format.
pub fn format_page_number(format: &str, page_number: u32, total: usize) -> String {
    format
        .replace("{n}", &page_number.to_string())
        .replace("{total}", &total.to_string())
}

/// One page-number label per selected page.
pub fn page_numbers(
    document: &DocumentInfo,
    pages: &PageRange,
    options: &StampOptions,
) -> Result<Vec<DrawInstruction>> {
    let font = StandardFont::resolve(&options.font_family);
    let color = Rgb::parse(&options.color);
    let total = document.page_count();

    let mut instructions = Vec::with_capacity(pages.len());
    for &page_number in pages {
        let page_index = (page_number - 1) as usize;
        let size = document.require_page(page_index)?;
        let label = format_page_number(&options.number_format, page_number, total);
        let origin = label_origin(size, &label, options);

        instructions.push(DrawInstruction::Text {
            page_index,
            origin,
            content: label,
            font,
            size: options.font_size,
            color,
            opacity: 1.0,
            rotation: 0.0,
        });
    }

    tracing::debug!(pages = instructions.len(), "built page number stamps");
    Ok(instructions)
}

fn label_origin(page: PageSize, label: &str, options: &StampOptions) -> DocumentPoint {
    let width = estimate_text_width(label, options.font_size);
    let bottom = page.origin_y + options.margin;
    let top = page.top() - options.margin - options.font_size;
    let center = page.origin_x + (page.width - width) / 2.0;
    let right = page.origin_x + page.width - options.margin - width;

    match options.number_position {
        StampPosition::BottomCenter => DocumentPoint::new(center, bottom),
        StampPosition::BottomRight => DocumentPoint::new(right, bottom),
        StampPosition::TopCenter => DocumentPoint::new(center, top),
        StampPosition::TopRight => DocumentPoint::new(right, top),
    }
}

/// A rotated, translucent label centred on each selected page.
pub fn watermark(
    document: &DocumentInfo,
    pages: &PageRange,
    text: &str,
    options: &StampOptions,
) -> Result<Vec<DrawInstruction>> {
    let font = StandardFont::resolve(&options.font_family);
    let color = Rgb::parse(&options.watermark_color);
    let size = options.watermark_font_size;
    let width = estimate_text_width(text, size);
    let (sin, cos) = options.watermark_angle.to_radians().sin_cos();

    let mut instructions = Vec::with_capacity(pages.len());
    for page_index in pages.zero_based() {
        let page = document.require_page(page_index)?;
        let cx = page.origin_x + page.width / 2.0;
        let cy = page.origin_y + page.height / 2.0;
        // Shift back by half the run along the baseline and half the cap height across it.
        let half_w = width / 2.0;
        let half_h = size * CAP_HEIGHT / 2.0;
        let origin = DocumentPoint::new(
            cx - half_w * cos + half_h * sin,
            cy - half_w * sin - half_h * cos,
        );

        instructions.push(DrawInstruction::Text {
            page_index,
            origin,
            content: text.to_string(),
            font,
            size,
            color,
            opacity: options.watermark_opacity.clamp(0.0, 1.0),
            rotation: options.watermark_angle,
        });
    }

    tracing::debug!(pages = instructions.len(), "built watermark stamps");
    Ok(instructions)
}
