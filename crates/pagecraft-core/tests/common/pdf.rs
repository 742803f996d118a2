//! Small lopdf-built documents for the pipeline tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One page: size in points plus `(text, x, y, size)` lines.
pub struct TestPage<'a> {
    pub width: i64,
    pub height: i64,
    pub lines: &'a [(&'a str, i64, i64, i64)],
}

pub fn build(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for &(text, x, y, size) in page.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Letter pages whose only text is "Page N".
pub fn numbered(count: usize) -> Vec<u8> {
    let labels: Vec<String> = (1..=count).map(|n| format!("Page {}", n)).collect();
    let lines: Vec<[(&str, i64, i64, i64); 1]> =
        labels.iter().map(|l| [(l.as_str(), 100, 700, 12)]).collect();
    let pages: Vec<TestPage> = lines
        .iter()
        .map(|l| TestPage {
            width: 612,
            height: 792,
            lines: l,
        })
        .collect();
    build(&pages)
}

/// Move every page's MediaBox up by `dy`, keeping its size.
pub fn shift_media_box(bytes: &[u8], dy: i64) -> Vec<u8> {
    let mut doc = Document::load_mem(bytes).unwrap();
    let page_ids: Vec<_> = doc.get_pages().values().copied().collect();
    for id in page_ids {
        let page = doc.get_object_mut(id).unwrap().as_dict_mut().unwrap();
        let media_box: Vec<i64> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_i64().unwrap())
            .collect();
        page.set(
            "MediaBox",
            vec![
                media_box[0].into(),
                (media_box[1] + dy).into(),
                media_box[2].into(),
                (media_box[3] + dy).into(),
            ],
        );
    }
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Text shown on each page, in content-stream order.
pub fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => {
                        Some(String::from_utf8_lossy(bytes).into_owned())
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
}
