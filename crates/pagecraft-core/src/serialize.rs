//! Text and HTML renditions of reconstructed layout

use crate::layout::{to_blocks, LayoutBlock, PageText};

/// Form feed, the conventional plain-text page separator.
pub const PAGE_BREAK: char = '\u{0C}';

/// Paragraphs separated by a blank line, pages by a form feed.
pub fn to_plain_text(pages: &[PageText]) -> String {
    let mut out = String::new();
    let mut first_on_page = true;

    for block in to_blocks(pages) {
        match block {
            LayoutBlock::Paragraph(text) => {
                if !first_on_page {
                    out.push_str("\n\n");
                }
                out.push_str(&text);
                first_on_page = false;
            }
            LayoutBlock::PageBreak => {
                out.push('\n');
                out.push(PAGE_BREAK);
                first_on_page = true;
            }
        }
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// A standalone HTML document with one `<p>` per paragraph.
pub fn to_html(pages: &[PageText], title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("<style>.page-break { page-break-after: always; }</style>\n");
    out.push_str("</head>\n<body>\n");

    for block in to_blocks(pages) {
        match block {
            LayoutBlock::Paragraph(text) => {
                out.push_str(&format!("<p>{}</p>\n", escape_html(&text)));
            }
            LayoutBlock::PageBreak => out.push_str("<div class=\"page-break\"></div>\n"),
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
