//! Writing draw instructions, raster pages and page subsets with lopdf

use super::images::{self, ImageXObject};
use super::{load, save};
use crate::annotation::ImageKind;
use crate::collaborators::Encoded;
use crate::error::{EngineError, Result};
use crate::flatten::DrawInstruction;
use crate::geometry::{DocumentPoint, DocumentRect, PageSize};
use crate::page_range::PageRange;
use crate::pagination::Pagination;
use crate::style::{Rgb, StandardFont};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, HashSet};

/// Text leading as a multiple of the font size.
const LINE_SPACING: f64 = 1.2;

/// Draw instructions on top of the existing pages of `source`.
pub fn annotate(source: &[u8], instructions: &[DrawInstruction]) -> Result<Encoded> {
    let mut doc = load(source)?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let mut by_page: BTreeMap<usize, Vec<&DrawInstruction>> = BTreeMap::new();
    for instruction in instructions {
        by_page
            .entry(instruction.page_index())
            .or_default()
            .push(instruction);
    }

    for (page_index, page_instructions) in &by_page {
        let page_id = *page_ids.get(*page_index).ok_or_else(|| {
            EngineError::PreconditionViolation(format!(
                "instruction for page index {} but the document has {} pages",
                page_index,
                page_ids.len()
            ))
        })?;

        let mut canvas = PageCanvas::default();
        for instruction in page_instructions {
            canvas.draw(&mut doc, instruction)?;
        }
        canvas.apply(&mut doc, page_id)?;
    }

    tracing::debug!(
        instructions = instructions.len(),
        pages = by_page.len(),
        "annotated document"
    );
    save(doc)
}

/// One page per placement, each drawing the whole raster shifted into its window.
pub fn paginate_raster(raster: &[u8], pagination: &Pagination) -> Result<Encoded> {
    let kind = ImageKind::detect(raster)
        .ok_or_else(|| EngineError::RenderFailure("rendered surface is not a PNG or JPEG".into()))?;

    let mut builder = DocumentBuilder::new();
    let image = images::embed(&mut builder.doc, kind, raster)?;
    let name = image_name(&image);
    let resources_id = builder.doc.add_object(dictionary! {
        "XObject" => dictionary! { name.as_str() => image.id },
    });

    let page = PageSize::new(pagination.page_width, pagination.page_height);
    for placement in &pagination.placements {
        let origin_y = placement.image_origin_y(pagination.page_height, pagination.scaled_height);
        let rect = DocumentRect {
            x: 0.0,
            y: origin_y,
            width: pagination.page_width,
            height: pagination.scaled_height,
        };
        let content = Content {
            operations: image_operations(&name, rect),
        };
        builder.add_page(page, content, Object::Reference(resources_id))?;
    }

    tracing::debug!(pages = pagination.page_count(), "encoded raster pages");
    builder.finish()
}

/// Keep only `pages` of `source`, in ascending order.
pub fn extract_pages(source: &[u8], pages: &PageRange) -> Result<Encoded> {
    let mut doc = load(source)?;
    let page_count = doc.get_pages().len() as u32;

    if let Some(&missing) = pages.pages().iter().find(|&&p| p > page_count) {
        return Err(EngineError::PreconditionViolation(format!(
            "Page {} does not exist (document has {} pages)",
            missing, page_count
        )));
    }

    // Delete from the back so earlier page numbers stay valid.
    let mut to_delete: Vec<u32> = (1..=page_count).filter(|p| !pages.contains(*p)).collect();
    to_delete.reverse();
    for page_num in to_delete {
        doc.delete_pages(&[page_num]);
    }

    doc.prune_objects();
    doc.compress();

    tracing::debug!(kept = pages.len(), of = page_count, "extracted pages");
    save(doc)
}

/// Assembles a new document page by page.
struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl DocumentBuilder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn add_page(&mut self, size: PageSize, content: Content, resources: Object) -> Result<()> {
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, encode(&content)?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(size.width), real(size.height)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    fn finish(mut self) -> Result<Encoded> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        save(self.doc)
    }
}

/// Operations and resources accumulated for one page.
#[derive(Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    fonts: Vec<StandardFont>,
    graphics_states: Vec<(String, f64)>,
    images: Vec<(String, ObjectId)>,
}

impl PageCanvas {
    fn draw(&mut self, doc: &mut Document, instruction: &DrawInstruction) -> Result<()> {
        match instruction {
            DrawInstruction::Text {
                origin,
                content,
                font,
                size,
                color,
                opacity,
                rotation,
                ..
            } => {
                self.text(*origin, content, *font, *size, *color, *opacity, *rotation);
                Ok(())
            }
            DrawInstruction::Image { rect, kind, data, .. } => {
                let image = images::embed(doc, *kind, data)?;
                let name = image_name(&image);
                self.operations.extend(image_operations(&name, *rect));
                self.images.push((name, image.id));
                Ok(())
            }
            DrawInstruction::Path {
                points,
                color,
                width,
                ..
            } => {
                self.path(points, *color, *width);
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        origin: DocumentPoint,
        content: &str,
        font: StandardFont,
        size: f64,
        color: Rgb,
        opacity: f64,
        rotation: f64,
    ) {
        if !self.fonts.contains(&font) {
            self.fonts.push(font);
        }

        self.operations.push(Operation::new("q", vec![]));
        if opacity < 1.0 {
            let name = self.graphics_state(opacity);
            self.operations
                .push(Operation::new("gs", vec![Object::Name(name.into_bytes())]));
        }

        let (sin, cos) = rotation.to_radians().sin_cos();
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource_name().into_bytes()), real(size)],
        ));
        self.operations.push(Operation::new("rg", rgb(color)));
        self.operations
            .push(Operation::new("TL", vec![real(size * LINE_SPACING)]));
        self.operations.push(Operation::new(
            "Tm",
            vec![
                real(cos),
                real(sin),
                real(-sin),
                real(cos),
                real(origin.x),
                real(origin.y),
            ],
        ));
        for (i, line) in content.split('\n').enumerate() {
            if i > 0 {
                self.operations.push(Operation::new("T*", vec![]));
            }
            self.operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            ));
        }
        self.operations.push(Operation::new("ET", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn path(&mut self, points: &[DocumentPoint], color: Rgb, width: f64) {
        let Some(first) = points.first() else {
            return;
        };

        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new("w", vec![real(width)]));
        self.operations.push(Operation::new("RG", rgb(color)));
        // Round caps and joins; a single point still draws a dot.
        self.operations.push(Operation::new("J", vec![1.into()]));
        self.operations.push(Operation::new("j", vec![1.into()]));
        self.operations
            .push(Operation::new("m", vec![real(first.x), real(first.y)]));
        if points.len() == 1 {
            self.operations
                .push(Operation::new("l", vec![real(first.x), real(first.y)]));
        }
        for point in &points[1..] {
            self.operations
                .push(Operation::new("l", vec![real(point.x), real(point.y)]));
        }
        self.operations.push(Operation::new("S", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    fn graphics_state(&mut self, opacity: f64) -> String {
        let name = format!("PCGS{}", (opacity.clamp(0.0, 1.0) * 100.0).round() as u32);
        if !self.graphics_states.iter().any(|(n, _)| *n == name) {
            self.graphics_states.push((name.clone(), opacity));
        }
        name
    }

    /// Register resources on the page and append the drawing after its existing content.
    fn apply(self, doc: &mut Document, page_id: ObjectId) -> Result<()> {
        let fonts: Vec<(String, Object)> = self
            .fonts
            .iter()
            .map(|font| {
                let mut dict = dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => Object::Name(font.base_name().as_bytes().to_vec()),
                };
                if !matches!(font, StandardFont::Symbol | StandardFont::ZapfDingbats) {
                    dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
                }
                (font.resource_name(), Object::Reference(doc.add_object(dict)))
            })
            .collect();
        let states: Vec<(String, Object)> = self
            .graphics_states
            .iter()
            .map(|(name, opacity)| {
                let dict = dictionary! {
                    "Type" => "ExtGState",
                    "ca" => real(*opacity),
                    "CA" => real(*opacity),
                };
                (name.clone(), Object::Reference(doc.add_object(dict)))
            })
            .collect();
        let images: Vec<(String, Object)> = self
            .images
            .iter()
            .map(|(name, id)| (name.clone(), Object::Reference(*id)))
            .collect();

        register_resources(doc, page_id, "Font", fonts)?;
        register_resources(doc, page_id, "ExtGState", states)?;
        register_resources(doc, page_id, "XObject", images)?;

        let content = Content {
            operations: self.operations,
        };
        append_content(doc, page_id, encode(&content)?)
    }
}

fn image_name(image: &ImageXObject) -> String {
    format!("PCIm{}", image.id.0)
}

fn image_operations(name: &str, rect: DocumentRect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(rect.width),
                0.into(),
                0.into(),
                real(rect.height),
                real(rect.x),
                real(rect.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn encode(content: &Content) -> Result<Vec<u8>> {
    content
        .encode()
        .map_err(|e| EngineError::RenderFailure(format!("content encoding failed: {}", e)))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rgb(color: Rgb) -> Vec<Object> {
    vec![
        Object::Real(color.r),
        Object::Real(color.g),
        Object::Real(color.b),
    ]
}

/// Characters outside WinAnsi become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            0x09 => b' ',
            0x20AC => 0x80,
            0x2026 => 0x85,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            _ => b'?',
        })
        .collect()
}

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    Ok(doc.get_object(page_id)?.as_dict()?)
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Where a page's resource dictionary lives.
#[derive(Debug, Clone, Copy)]
enum Resources {
    Inline,
    Shared(ObjectId),
}

/// Make sure the page owns a resource dictionary, copying inherited resources down.
fn locate_resources(doc: &mut Document, page_id: ObjectId) -> Result<Resources> {
    let own = page_dict(doc, page_id)?.get(b"Resources").ok().cloned();
    match own {
        Some(Object::Reference(id)) => Ok(Resources::Shared(id)),
        Some(Object::Dictionary(_)) => Ok(Resources::Inline),
        _ => {
            let inherited = inherited_resources(doc, page_id);
            page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(inherited));
            Ok(Resources::Inline)
        }
    }
}

fn inherited_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut seen = HashSet::new();
    let mut current = page_dict(doc, page_id)
        .ok()
        .and_then(|dict| dict.get(b"Parent").and_then(Object::as_reference).ok());

    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let Ok(dict) = page_dict(doc, id) else {
            break;
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return resources.clone(),
            Ok(Object::Reference(res_id)) => {
                if let Ok(resources) = page_dict(doc, *res_id) {
                    return resources.clone();
                }
            }
            _ => {}
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Dictionary::new()
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    location: Resources,
) -> Result<&mut Dictionary> {
    match location {
        Resources::Shared(id) => page_dict_mut(doc, id),
        Resources::Inline => Ok(page_dict_mut(doc, page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?),
    }
}

/// Merge named entries into one category (`Font`, `XObject`, ...) of the page resources.
fn register_resources(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    entries: Vec<(String, Object)>,
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let location = locate_resources(doc, page_id)?;
    let existing = resources_mut(doc, page_id, location)?
        .get(category.as_bytes())
        .ok()
        .cloned();

    let mut category_dict = match existing {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => page_dict(doc, id).cloned().unwrap_or_else(|_| {
            tracing::warn!(category, "dangling resource reference replaced");
            Dictionary::new()
        }),
        _ => Dictionary::new(),
    };
    for (name, value) in entries {
        category_dict.set(name, value);
    }

    resources_mut(doc, page_id, location)?.set(category, Object::Dictionary(category_dict));
    Ok(())
}

/// Append a content stream, isolating the page's own content in a saved graphics state.
fn append_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
    let existing: Vec<Object> = match page_dict(doc, page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    let mut drawing = Vec::with_capacity(content.len() + 2);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        drawing.extend_from_slice(b"\nQ\n");
    }
    drawing.extend(content);
    let drawing_id = doc.add_object(Stream::new(dictionary! {}, drawing));
    contents.push(Object::Reference(drawing_id));

    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DocumentRect;
    use crate::lopdf_backend::images::fixtures;
    use crate::lopdf_backend::test_pdf;
    use crate::pagination::paginate;
    use crate::config::PaginationOptions;

    fn page_content(bytes: &[u8], page_num: u32) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page_num];
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    fn text(page_index: usize, content: &str, opacity: f64) -> DrawInstruction {
        DrawInstruction::Text {
            page_index,
            origin: DocumentPoint::new(72.0, 700.0),
            content: content.to_string(),
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Rgb::BLACK,
            opacity,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_annotate_text_adds_font_and_content() {
        let pdf = test_pdf::numbered(2);
        let encoded = annotate(&pdf, &[text(1, "Hello (world)", 1.0)]).unwrap();
        assert_eq!(encoded.page_count, 2);

        let content = page_content(&encoded.bytes, 2);
        assert!(content.contains("Page 2"));
        assert!(content.contains("/PC0 12 Tf"));
        assert!(content.contains("Hello"));

        let doc = Document::load_mem(&encoded.bytes).unwrap();
        let page_id = doc.get_pages()[&2];
        let resources = match page_dict(&doc, page_id).unwrap().get(b"Resources").unwrap() {
            Object::Reference(id) => page_dict(&doc, *id).unwrap(),
            other => other.as_dict().unwrap(),
        };
        let has_font = match resources.get(b"Font").unwrap() {
            Object::Reference(id) => page_dict(&doc, *id).unwrap().has(b"PC0"),
            other => other.as_dict().unwrap().has(b"PC0"),
        };
        assert!(has_font);
    }

    #[test]
    fn test_untouched_pages_keep_their_content() {
        let pdf = test_pdf::numbered(2);
        let encoded = annotate(&pdf, &[text(1, "x", 1.0)]).unwrap();
        let first = page_content(&encoded.bytes, 1);
        assert!(first.contains("Page 1"));
        assert!(!first.contains("PC0"));
    }

    #[test]
    fn test_existing_content_is_isolated() {
        let pdf = test_pdf::numbered(1);
        let encoded = annotate(&pdf, &[text(0, "x", 1.0)]).unwrap();
        let content = page_content(&encoded.bytes, 1);
        let save = content.find('q').unwrap();
        let original = content.find("Page 1").unwrap();
        assert!(save < original);
    }

    #[test]
    fn test_translucent_text_uses_graphics_state() {
        let pdf = test_pdf::numbered(1);
        let encoded = annotate(&pdf, &[text(0, "DRAFT", 0.3)]).unwrap();
        assert!(page_content(&encoded.bytes, 1).contains("/PCGS30 gs"));
    }

    #[test]
    fn test_path_is_stroked() {
        let pdf = test_pdf::numbered(1);
        let path = DrawInstruction::Path {
            page_index: 0,
            points: vec![DocumentPoint::new(10.0, 10.0), DocumentPoint::new(20.0, 30.0)],
            color: Rgb::from_bytes(255, 0, 0),
            width: 2.0,
        };
        let content = page_content(&annotate(&pdf, &[path]).unwrap().bytes, 1);
        assert!(content.contains("1 0 0 RG"));
        assert!(content.contains("10 10 m"));
        assert!(content.contains("20 30 l"));
        assert!(content.contains("S"));
    }

    #[test]
    fn test_image_is_drawn_through_xobject() {
        let pdf = test_pdf::numbered(1);
        let image = DrawInstruction::Image {
            page_index: 0,
            rect: DocumentRect {
                x: 50.0,
                y: 60.0,
                width: 100.0,
                height: 80.0,
            },
            kind: ImageKind::Jpeg,
            data: fixtures::jpeg(4, 4),
        };
        let content = page_content(&annotate(&pdf, &[image]).unwrap().bytes, 1);
        assert!(content.contains("100 0 0 80 50 60 cm"));
        assert!(content.contains("Do"));
    }

    #[test]
    fn test_instruction_past_last_page_fails() {
        let pdf = test_pdf::numbered(1);
        let err = annotate(&pdf, &[text(3, "x", 1.0)]).unwrap_err();
        assert!(matches!(err, EngineError::PreconditionViolation(_)));
    }

    #[test]
    fn test_extract_pages_keeps_selection_in_order() {
        let pdf = test_pdf::numbered(3);
        let range = PageRange::parse("3,1", 3).unwrap();
        let encoded = extract_pages(&pdf, &range).unwrap();
        assert_eq!(encoded.page_count, 2);
        assert!(page_content(&encoded.bytes, 1).contains("Page 1"));
        assert!(page_content(&encoded.bytes, 2).contains("Page 3"));
    }

    #[test]
    fn test_extract_pages_past_end_fails() {
        let pdf = test_pdf::numbered(2);
        let range = PageRange::parse("3", 5).unwrap();
        assert!(extract_pages(&pdf, &range).is_err());
    }

    #[test]
    fn test_paginate_raster_builds_one_page_per_placement() {
        let png = fixtures::png(60, 250, png::ColorType::Rgb);
        let pagination =
            paginate(250.0, 60.0, 600.0, 1000.0, &PaginationOptions::default()).unwrap();
        assert_eq!(pagination.page_count(), 3);

        let encoded = paginate_raster(&png, &pagination).unwrap();
        assert_eq!(encoded.page_count, 3);
        // Last page: the image bottom sits 500 above the page bottom
        assert!(page_content(&encoded.bytes, 3).contains("600 0 0 2500 0 500 cm"));
    }

    #[test]
    fn test_paginate_raster_rejects_unknown_bytes() {
        let pagination = paginate(10.0, 10.0, 600.0, 800.0, &PaginationOptions::default()).unwrap();
        let err = paginate_raster(b"nope", &pagination).unwrap_err();
        assert!(matches!(err, EngineError::RenderFailure(_)));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("a\u{2019}b\u{4E2D}"), vec![b'a', 0x92, b'b', b'?']);
        assert_eq!(encode_win_ansi("caf\u{e9}"), b"caf\xe9".to_vec());
    }
}
