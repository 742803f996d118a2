//! Engine configuration
//!
//! Every knob has a default, so an empty JSON object is a valid configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Top-level configuration handed to the tool pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutOptions,
    pub pagination: PaginationOptions,
    pub stamp: StampOptions,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a JSON string; missing fields take their defaults.
    ///
    /// ```
    /// use pagecraft_core::EngineConfig;
    ///
    /// let config = EngineConfig::from_json(r#"{ "layout": { "paragraph_gap_factor": 2.0 } }"#)?;
    /// assert_eq!(config.layout.paragraph_gap_factor, 2.0);
    /// assert_eq!(config.layout.same_line_tolerance, 2.0);
    /// # Ok::<(), pagecraft_core::EngineError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationOptions) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_stamp(mut self, stamp: StampOptions) -> Self {
        self.stamp = stamp;
        self
    }
}

/// Thresholds for regrouping glyph runs into paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Baselines closer than this (document units) are on the same line.
    pub same_line_tolerance: f64,
    /// A vertical gap larger than this many line heights starts a new paragraph.
    pub paragraph_gap_factor: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            same_line_tolerance: 2.0,
            paragraph_gap_factor: 1.5,
        }
    }
}

impl LayoutOptions {
    pub fn with_same_line_tolerance(mut self, tolerance: f64) -> Self {
        self.same_line_tolerance = tolerance;
        self
    }

    pub fn with_paragraph_gap_factor(mut self, factor: f64) -> Self {
        self.paragraph_gap_factor = factor;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Leftover height (document units) below which no further page is started.
    pub epsilon: f64,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self { epsilon: 1e-6 }
    }
}

/// Where page numbers go on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StampPosition {
    BottomCenter,
    BottomRight,
    TopCenter,
    TopRight,
}

/// Appearance of page numbers and watermarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampOptions {
    /// `{n}` is the page number, `{total}` the page count.
    pub number_format: String,
    pub number_position: StampPosition,
    pub font_family: String,
    pub font_size: f64,
    /// Distance from the page edge in document units.
    pub margin: f64,
    pub color: String,
    pub watermark_font_size: f64,
    pub watermark_opacity: f64,
    /// Degrees, counter-clockwise.
    pub watermark_angle: f64,
    pub watermark_color: String,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            number_format: "{n}".to_string(),
            number_position: StampPosition::BottomCenter,
            font_family: "Helvetica".to_string(),
            font_size: 12.0,
            margin: 30.0,
            color: "#000000".to_string(),
            watermark_font_size: 60.0,
            watermark_opacity: 0.3,
            watermark_angle: 45.0,
            watermark_color: "#808080".to_string(),
        }
    }
}

impl StampOptions {
    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = format.into();
        self
    }

    pub fn with_number_position(mut self, position: StampPosition) -> Self {
        self.number_position = position;
        self
    }

    pub fn with_watermark_opacity(mut self, opacity: f64) -> Self {
        self.watermark_opacity = opacity.clamp(0.0, 1.0);
        self
    }
}
