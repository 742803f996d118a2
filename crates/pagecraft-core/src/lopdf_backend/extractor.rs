//! Glyph runs from page content streams
//!
//! Walks the text operators of each page and reports every shown string with its
//! baseline position in page space. Form XObjects are not followed.

use super::{load, number};
use crate::error::Result;
use crate::layout::GlyphRun;
use lopdf::content::Content;
use lopdf::Object;

/// TJ adjustment (thousandths of an em) wide enough to count as a word space.
const SPACE_THRESHOLD: f64 = 200.0;

pub fn extract_glyph_runs(source: &[u8]) -> Result<Vec<Vec<GlyphRun>>> {
    let doc = load(source)?;
    let pages = doc.get_pages();

    let mut result = Vec::with_capacity(pages.len());
    for (page_index, page_id) in pages.values().enumerate() {
        let runs = match doc.get_page_content(*page_id) {
            Ok(content) => runs_from_content(&content, page_index),
            Err(e) => {
                tracing::warn!(
                    page = page_index + 1,
                    error = %e,
                    "skipping unreadable content stream"
                );
                Vec::new()
            }
        };
        result.push(runs);
    }

    tracing::debug!(
        pages = result.len(),
        runs = result.iter().map(Vec::len).sum::<usize>(),
        "extracted glyph runs"
    );
    Ok(result)
}

fn runs_from_content(content: &[u8], page_index: usize) -> Vec<GlyphRun> {
    let content = match Content::decode(content) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                page = page_index + 1,
                error = %e,
                "skipping undecodable content stream"
            );
            return Vec::new();
        }
    };

    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => state.restore(),
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.ctm = m.multiply(&state.ctm);
                }
            }
            "BT" => {
                state.text = Matrix::IDENTITY;
                state.line = Matrix::IDENTITY;
                state.in_text = true;
            }
            "ET" => state.in_text = false,
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                    state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                    state.leading = -ty;
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.text = m;
                    state.line = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(decode_text(bytes), page_index, &mut runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(decode_text(bytes), page_index, &mut runs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    state.show(decode_text(bytes), page_index, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    state.show(join_tj(items), page_index, &mut runs);
                }
            }
            _ => {}
        }
    }

    runs
}

fn operand(operands: &[Object], i: usize) -> Option<f64> {
    operands.get(i).and_then(number)
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    Some(Matrix {
        a: number(&operands[0])?,
        b: number(&operands[1])?,
        c: number(&operands[2])?,
        d: number(&operands[3])?,
        e: number(&operands[4])?,
        f: number(&operands[5])?,
    })
}

/// Concatenate the strings of a TJ array, turning wide negative kerns into spaces.
fn join_tj(items: &[Object]) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_text(bytes)),
            other => {
                if let Some(adjustment) = number(other) {
                    if -adjustment > SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(' ')
                    {
                        combined.push(' ');
                    }
                }
            }
        }
    }
    combined
}

/// Decode a PDF string: UTF-16BE with BOM, then UTF-8, then Windows-1252.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| win_ansi_char(b)).collect()
}

fn win_ansi_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        b => b as char,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self` applied first, then `other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn translation(tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    text: Matrix,
    line: Matrix,
    font_size: f64,
    leading: f64,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text: Matrix::IDENTITY,
            line: Matrix::IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            in_text: false,
        }
    }
}

impl TextState {
    fn save(&mut self) {
        self.saved.push(self.ctm);
    }

    fn restore(&mut self) {
        if let Some(ctm) = self.saved.pop() {
            self.ctm = ctm;
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line = Matrix::translation(tx, ty).multiply(&self.line);
        self.text = self.line;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String, page_index: usize, runs: &mut Vec<GlyphRun>) {
        if !self.in_text || text.is_empty() {
            return;
        }
        let rendering = self.text.multiply(&self.ctm);
        runs.push(GlyphRun {
            text,
            x: rendering.e,
            y: rendering.f,
            height: self.font_size * rendering.vertical_scale(),
            page_index,
        });
    }
}
