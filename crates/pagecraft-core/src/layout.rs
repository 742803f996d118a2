//! Layout reconstruction from positioned text fragments
//!
//! Text extractors report glyph runs with baseline positions but in no reliable
//! order. This module puts them back into reading order (top to bottom, left to
//! right within a line) and splits paragraphs where the vertical gap between
//! consecutive runs is large compared to the line height.
//!
//! This is a heuristic: dense single-spaced documents can under-split and sparse
//! layouts can over-split.

use crate::config::LayoutOptions;
use serde::{Deserialize, Serialize};

/// A text fragment as reported by the text extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    pub text: String,
    /// Left edge of the baseline, in document units.
    pub x: f64,
    /// Baseline, in document units (y grows upward).
    pub y: f64,
    pub height: f64,
    /// 0-based source page.
    pub page_index: usize,
}

impl GlyphRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64, height: f64, page_index: usize) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            height,
            page_index,
        }
    }
}

/// Reconstructed paragraphs of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// 1-based page number.
    pub page_number: usize,
    pub paragraphs: Vec<String>,
}

/// Flat output sequence with explicit page separators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "text")]
pub enum LayoutBlock {
    Paragraph(String),
    PageBreak,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutReconstructor {
    options: LayoutOptions,
}

impl LayoutReconstructor {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Reconstruct every page. `pages[i]` holds the runs of page `i + 1`.
    pub fn reconstruct(&self, pages: &[Vec<GlyphRun>]) -> Vec<PageText> {
        let result: Vec<PageText> = pages
            .iter()
            .enumerate()
            .map(|(index, runs)| PageText {
                page_number: index + 1,
                paragraphs: self.reconstruct_page(runs),
            })
            .collect();

        tracing::debug!(
            pages = result.len(),
            paragraphs = result.iter().map(|p| p.paragraphs.len()).sum::<usize>(),
            "reconstructed layout"
        );
        result
    }

    /// Paragraphs of a single page, in reading order. No runs, no paragraphs.
    pub fn reconstruct_page(&self, runs: &[GlyphRun]) -> Vec<String> {
        let ordered = self.reading_order(runs);

        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut last: Option<(f64, f64)> = None;

        for run in ordered {
            if let Some((last_y, last_height)) = last {
                let gap = last_y - run.y;
                if gap > last_height * self.options.paragraph_gap_factor {
                    flush(&mut current, &mut paragraphs);
                    last = None;
                }
            }

            current.push_str(&run.text);
            current.push(' ');

            let height = match last {
                Some((_, last_height)) => last_height.max(run.height),
                None => run.height,
            };
            last = Some((run.y, height));
        }

        flush(&mut current, &mut paragraphs);
        paragraphs
    }

    /// Sort runs top to bottom, grouping baselines within the tolerance into one
    /// line ordered left to right.
    pub fn reading_order<'a>(&self, runs: &'a [GlyphRun]) -> Vec<&'a GlyphRun> {
        let mut by_y: Vec<&GlyphRun> = runs.iter().collect();
        by_y.sort_by(|a, b| b.y.total_cmp(&a.y));

        let mut ordered = Vec::with_capacity(by_y.len());
        let mut line: Vec<&GlyphRun> = Vec::new();

        for run in by_y {
            if let Some(first) = line.first() {
                if (first.y - run.y).abs() >= self.options.same_line_tolerance {
                    flush_line(&mut line, &mut ordered);
                }
            }
            line.push(run);
        }
        flush_line(&mut line, &mut ordered);

        ordered
    }
}

fn flush_line<'a>(line: &mut Vec<&'a GlyphRun>, ordered: &mut Vec<&'a GlyphRun>) {
    line.sort_by(|a, b| a.x.total_cmp(&b.x));
    ordered.append(line);
}

fn flush(current: &mut String, paragraphs: &mut Vec<String>) {
    let text = collapse_whitespace(current);
    if !text.is_empty() {
        paragraphs.push(text);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regroup a flat list of runs by their source page.
pub fn group_by_page(runs: Vec<GlyphRun>, page_count: usize) -> Vec<Vec<GlyphRun>> {
    let mut pages = vec![Vec::new(); page_count];
    for run in runs {
        match pages.get_mut(run.page_index) {
            Some(page) => page.push(run),
            None => tracing::warn!(page = run.page_index, "glyph run outside the document"),
        }
    }
    pages
}

/// Flatten reconstructed pages into paragraphs separated by page breaks.
pub fn to_blocks(pages: &[PageText]) -> Vec<LayoutBlock> {
    let mut blocks = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            blocks.push(LayoutBlock::PageBreak);
        }
        blocks.extend(page.paragraphs.iter().cloned().map(LayoutBlock::Paragraph));
    }
    blocks
}
