//! Source files, document metadata and tool output

use crate::error::{EngineError, Result};
use crate::geometry::PageSize;
use serde::Serialize;

/// Page count and per-page size, discovered once when a document is loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    page_sizes: Vec<PageSize>,
}

impl DocumentInfo {
    pub fn new(page_sizes: Vec<PageSize>) -> Self {
        Self { page_sizes }
    }

    pub fn uniform(page_count: usize, size: PageSize) -> Self {
        Self {
            page_sizes: vec![size; page_count],
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    pub fn page_size(&self, page_index: usize) -> Option<PageSize> {
        self.page_sizes.get(page_index).copied()
    }

    /// Size of a page the caller already knows exists; anything else is a defect.
    pub fn require_page(&self, page_index: usize) -> Result<PageSize> {
        self.page_size(page_index).ok_or_else(|| {
            EngineError::PreconditionViolation(format!(
                "page index {} is outside the document ({} pages)",
                page_index,
                self.page_count()
            ))
        })
    }
}

/// File kinds the tools accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    Pdf,
    Docx,
    Png,
    Jpeg,
    Unknown,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Pdf => "PDF",
            SourceKind::Docx => "Word document",
            SourceKind::Png => "PNG image",
            SourceKind::Jpeg => "JPEG image",
            SourceKind::Unknown => "unknown file",
        }
    }
}

/// Raw bytes of a user-selected file plus its name.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Classify by magic bytes, using the extension to tell DOCX from other zips.
    pub fn kind(&self) -> SourceKind {
        let bytes = &self.bytes;
        if bytes.starts_with(b"%PDF-") {
            SourceKind::Pdf
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            SourceKind::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            SourceKind::Jpeg
        } else if bytes.starts_with(b"PK\x03\x04") && self.extension() == "docx" {
            SourceKind::Docx
        } else {
            SourceKind::Unknown
        }
    }

    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Stem of the file name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    /// Reject the file before any processing when it is not what the tool expects.
    pub fn require(&self, expected: SourceKind) -> Result<()> {
        let actual = self.kind();
        if actual != expected {
            return Err(EngineError::InvalidInput(format!(
                "expected a {}, got a {}",
                expected.label(),
                actual.label()
            )));
        }
        Ok(())
    }
}

/// Finished artifact handed to the download trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: String,
}

impl Output {
    pub const PDF: &'static str = "application/pdf";
    pub const TEXT: &'static str = "text/plain; charset=utf-8";
    pub const HTML: &'static str = "text/html; charset=utf-8";

    pub fn new(bytes: Vec<u8>, mime_type: &'static str, filename: String) -> Self {
        Self {
            bytes,
            mime_type,
            filename,
        }
    }
}
