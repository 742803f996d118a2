//! Document layout and annotation engine
//!
//! Client-side document tools built on lopdf:
//! - `page_range`: parse "1-3, 5" style selections
//! - `geometry` / `annotation` / `flatten`: viewer-space edits mapped into PDF space
//! - `pagination`: slice one tall rendered bitmap across output pages
//! - `layout` / `serialize`: recover paragraphs from positioned glyph runs
//! - `tools`: the user-facing pipelines, with every I/O collaborator injected

pub mod annotation;
pub mod collaborators;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod layout;
pub mod lopdf_backend;
pub mod page_range;
pub mod pagination;
pub mod serialize;
pub mod stamp;
pub mod style;
pub mod tools;

pub use annotation::{AnnotationModel, Edit, EditId, EditKind, ImageEdit, TextEdit, Tool};
pub use collaborators::{
    DocumentProbe, Encoded, Encoder, GlyphExtractor, MarkupConverter, MarkupRenderer,
    RenderSurface,
};
pub use config::{EngineConfig, LayoutOptions, PaginationOptions, StampOptions, StampPosition};
pub use document::{DocumentInfo, Output, SourceFile, SourceKind};
pub use error::{EngineError, ErrorCategory, PageRangeError, Result};
pub use flatten::DrawInstruction;
pub use geometry::{CoordinateMapper, PageSize, RasterFrame, ViewerPoint, ViewerRect};
pub use layout::{GlyphRun, LayoutReconstructor, PageText};
pub use lopdf_backend::LopdfBackend;
pub use page_range::PageRange;
pub use pagination::{paginate, Pagination, Placement};

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Byte fields carried as base64 strings in JSON.
pub(crate) mod bytes_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
