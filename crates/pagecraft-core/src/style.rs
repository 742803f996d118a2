//! Font and colour resolution
//!
//! Edits carry CSS-ish font families and colour strings chosen in the browser.
//! The encoder only understands the PDF standard 14 fonts and RGB components.

use serde::{Deserialize, Serialize};

/// RGB colour with components in the 0-1 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#RRGGBB`, `#RGB` or a CSS colour name. Unknown input is black.
    pub fn parse(color: &str) -> Self {
        match try_parse_color(color) {
            Some(rgb) => rgb,
            None => {
                tracing::warn!(color, "unrecognised colour, falling back to black");
                Rgb::BLACK
            }
        }
    }
}

fn try_parse_color(color: &str) -> Option<Rgb> {
    let color = color.trim();
    let lower = color.to_ascii_lowercase();

    let named = match lower.as_str() {
        "black" => Some((0, 0, 0)),
        "white" => Some((255, 255, 255)),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    };
    if let Some((r, g, b)) = named {
        return Some(Rgb::from_bytes(r, g, b));
    }

    let hex = color.strip_prefix('#').unwrap_or(color);
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::from_bytes(r, g, b))
        }
        3 => {
            let mut parts = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                parts[i] = v * 17;
            }
            Some(Rgb::from_bytes(parts[0], parts[1], parts[2]))
        }
        _ => None,
    }
}

/// The PDF standard 14 fonts that need no embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    /// PostScript base font name.
    pub fn base_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Resource name used inside page content streams.
    pub fn resource_name(self) -> String {
        format!("PC{}", self as u8)
    }

    /// Map a font family such as `"serif"`, `"Arial"` or `"Times New Roman Bold"`.
    pub fn resolve(family: &str) -> Self {
        let lower = family.to_lowercase();
        let bold = lower.contains("bold");
        let italic = lower.contains("italic") || lower.contains("oblique");

        if lower.contains("symbol") {
            return StandardFont::Symbol;
        }
        if lower.contains("zapf") || lower.contains("dingbat") {
            return StandardFont::ZapfDingbats;
        }

        match (Family::of(&lower), bold, italic) {
            (Family::Times, true, true) => StandardFont::TimesBoldItalic,
            (Family::Times, true, false) => StandardFont::TimesBold,
            (Family::Times, false, true) => StandardFont::TimesItalic,
            (Family::Times, false, false) => StandardFont::TimesRoman,
            (Family::Courier, true, true) => StandardFont::CourierBoldOblique,
            (Family::Courier, true, false) => StandardFont::CourierBold,
            (Family::Courier, false, true) => StandardFont::CourierOblique,
            (Family::Courier, false, false) => StandardFont::Courier,
            (Family::Helvetica, true, true) => StandardFont::HelveticaBoldOblique,
            (Family::Helvetica, true, false) => StandardFont::HelveticaBold,
            (Family::Helvetica, false, true) => StandardFont::HelveticaOblique,
            (Family::Helvetica, false, false) => StandardFont::Helvetica,
        }
    }
}

enum Family {
    Times,
    Courier,
    Helvetica,
}

impl Family {
    fn of(lower: &str) -> Self {
        // Exact CSS generic families first; "sans-serif" contains "serif".
        match lower.trim() {
            "serif" => return Family::Times,
            "sans-serif" | "cursive" | "fantasy" => return Family::Helvetica,
            "monospace" => return Family::Courier,
            _ => {}
        }

        if lower.contains("times") || lower.contains("georgia") || lower.contains("garamond") {
            Family::Times
        } else if lower.contains("courier")
            || lower.contains("mono")
            || lower.contains("consolas")
            || lower.contains("monaco")
        {
            Family::Courier
        } else {
            Family::Helvetica
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_mapping_css_generic_families() {
        assert_eq!(StandardFont::resolve("serif"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::resolve("sans-serif"), StandardFont::Helvetica);
        assert_eq!(StandardFont::resolve("monospace"), StandardFont::Courier);
        assert_eq!(StandardFont::resolve("cursive"), StandardFont::Helvetica);
    }

    #[test]
    fn test_font_mapping_named_families() {
        assert_eq!(StandardFont::resolve("Times New Roman"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::resolve("Arial"), StandardFont::Helvetica);
        assert_eq!(StandardFont::resolve("Arial-BoldMT"), StandardFont::HelveticaBold);
        assert_eq!(StandardFont::resolve("Courier New"), StandardFont::Courier);
        assert_eq!(StandardFont::resolve("Consolas"), StandardFont::Courier);
        assert_eq!(
            StandardFont::resolve("Times-BoldItalic"),
            StandardFont::TimesBoldItalic
        );
        assert_eq!(StandardFont::resolve("Symbol"), StandardFont::Symbol);
    }

    #[test]
    fn test_font_mapping_unknown_defaults_to_helvetica() {
        assert_eq!(StandardFont::resolve("g_d0_f1"), StandardFont::Helvetica);
        assert_eq!(StandardFont::resolve(""), StandardFont::Helvetica);
    }

    #[test]
    fn test_resource_names_are_distinct() {
        assert_ne!(
            StandardFont::Helvetica.resource_name(),
            StandardFont::TimesRoman.resource_name()
        );
        assert_eq!(StandardFont::TimesBold.base_name(), "Times-Bold");
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(Rgb::parse("#FF0000"), Rgb::from_bytes(255, 0, 0));
        assert_eq!(Rgb::parse("00ff00"), Rgb::from_bytes(0, 255, 0));
        assert_eq!(Rgb::parse("#00f"), Rgb::from_bytes(0, 0, 255));
    }

    #[test]
    fn test_parse_named_and_invalid_colors() {
        assert_eq!(Rgb::parse("Red"), Rgb::from_bytes(255, 0, 0));
        assert_eq!(Rgb::parse("#GG0000"), Rgb::BLACK);
        assert_eq!(Rgb::parse("rebeccapurple-ish"), Rgb::BLACK);
        assert_eq!(Rgb::parse("#ééé"), Rgb::BLACK);
    }
}
