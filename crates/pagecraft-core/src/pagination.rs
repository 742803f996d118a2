//! Slice one tall rendered image across fixed-size output pages
//!
//! Every output page draws the whole image scaled to the page width, shifted up by
//! one page height per page, so each page shows the next window of the image.

use crate::config::PaginationOptions;
use crate::error::{EngineError, Result};
use serde::Serialize;

/// Where the scaled image sits on one output page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// 0-based output page.
    pub page_number: usize,
    /// Distance from the page's top edge down to the image's top edge; zero or negative.
    pub vertical_offset: f64,
}

impl Placement {
    /// Part of the scaled image (measured from its top) visible on this page.
    pub fn visible_window(&self, page_height: f64, scaled_height: f64) -> (f64, f64) {
        let start = (-self.vertical_offset).clamp(0.0, scaled_height);
        let end = (start + page_height).min(scaled_height);
        (start, end)
    }

    /// Bottom-left y of the image in the page's document space.
    pub fn image_origin_y(&self, page_height: f64, scaled_height: f64) -> f64 {
        page_height - self.vertical_offset - scaled_height
    }
}

/// Result of paginating one raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page_width: f64,
    pub page_height: f64,
    pub scaled_height: f64,
    pub placements: Vec<Placement>,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// Sum of the visible image heights over all pages.
    pub fn covered_height(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| {
                let (start, end) = p.visible_window(self.page_height, self.scaled_height);
                end - start
            })
            .sum()
    }
}

/// Compute the page placements for a `raster_width` x `raster_height` image laid
/// out on `page_width` x `page_height` pages.
pub fn paginate(
    raster_height: f64,
    raster_width: f64,
    page_width: f64,
    page_height: f64,
    options: &PaginationOptions,
) -> Result<Pagination> {
    for (name, value) in [
        ("raster width", raster_width),
        ("raster height", raster_height),
        ("page width", page_width),
        ("page height", page_height),
    ] {
        if !(value > 0.0) || !value.is_finite() {
            return Err(EngineError::PreconditionViolation(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
    }

    let scaled_height = raster_height * (page_width / raster_width);

    let mut placements = Vec::new();
    let mut page = 0;
    let mut offset = 0.0;
    let mut remaining = scaled_height;

    placements.push(Placement {
        page_number: page,
        vertical_offset: offset,
    });
    remaining -= page_height;

    while remaining > options.epsilon {
        offset -= page_height;
        page += 1;
        placements.push(Placement {
            page_number: page,
            vertical_offset: offset,
        });
        remaining -= page_height;
    }

    tracing::debug!(
        scaled_height,
        pages = placements.len(),
        "paginated raster"
    );

    Ok(Pagination {
        page_width,
        page_height,
        scaled_height,
        placements,
    })
}
