//! Page count and page sizes

use super::{load, number};
use crate::document::DocumentInfo;
use crate::error::{EngineError, Result};
use crate::geometry::PageSize;
use lopdf::{Document, Object, ObjectId};

/// Page tree depth beyond which the MediaBox lookup gives up.
const MAX_INHERITANCE_DEPTH: usize = 32;

pub fn probe_document(source: &[u8]) -> Result<DocumentInfo> {
    let doc = load(source)?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(EngineError::CorruptOrProtected("document has no pages".into()));
    }

    let mut sizes = Vec::with_capacity(pages.len());
    for (page_num, page_id) in &pages {
        let [x1, y1, x2, y2] = media_box(&doc, *page_id)
            .map_err(|e| EngineError::CorruptOrProtected(format!("page {}: {}", page_num, e)))?;
        sizes.push(
            PageSize::new((x2 - x1).abs(), (y2 - y1).abs()).with_origin(x1.min(x2), y1.min(y2)),
        );
    }

    tracing::debug!(pages = sizes.len(), "probed document");
    Ok(DocumentInfo::new(sizes))
}

/// MediaBox of a page, inherited from the page tree when the page has none.
pub(crate) fn media_box(
    doc: &Document,
    page_id: ObjectId,
) -> std::result::Result<[f64; 4], String> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth > MAX_INHERITANCE_DEPTH {
            break;
        }
        let dict = doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|_| "page is not a dictionary".to_string())?;

        if let Ok(raw) = dict.get(b"MediaBox") {
            let resolved = match raw {
                Object::Reference(box_id) => doc
                    .get_object(*box_id)
                    .map_err(|_| "MediaBox reference is dangling".to_string())?,
                other => other,
            };
            if let Ok(array) = resolved.as_array() {
                return parse_box_array(array);
            }
        }

        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    // Default to US Letter size
    Ok([0.0, 0.0, 612.0, 792.0])
}

fn parse_box_array(array: &[Object]) -> std::result::Result<[f64; 4], String> {
    if array.len() != 4 {
        return Err("MediaBox must have 4 elements".to_string());
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = number(obj).ok_or_else(|| format!("MediaBox element {} is not a number", i))?;
    }
    Ok(result)
}
