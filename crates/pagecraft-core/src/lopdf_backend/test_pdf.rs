//! Small in-memory PDFs for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// `(text, x, y, size)` drawn with Helvetica as `/F1`.
pub type Line<'a> = (&'a str, i64, i64, i64);

/// Blank pages of the given sizes.
pub fn with_sizes(sizes: &[(i64, i64)]) -> Vec<u8> {
    let pages: Vec<((i64, i64), Vec<Line>)> = sizes.iter().map(|s| (*s, vec![])).collect();
    build(&pages)
}

/// Letter pages, each with its lines of text.
pub fn with_text(pages: &[&[Line]]) -> Vec<u8> {
    let pages: Vec<((i64, i64), Vec<Line>)> =
        pages.iter().map(|lines| ((612, 792), lines.to_vec())).collect();
    build(&pages)
}

/// Letter pages labelled "Page N".
pub fn numbered(count: usize) -> Vec<u8> {
    let labels: Vec<String> = (1..=count).map(|i| format!("Page {}", i)).collect();
    let pages: Vec<((i64, i64), Vec<Line>)> = labels
        .iter()
        .map(|label| ((612, 792), vec![(label.as_str(), 100, 700, 12)]))
        .collect();
    build(&pages)
}

fn build(pages: &[((i64, i64), Vec<Line>)]) -> Vec<u8> {
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
    for ((width, height), lines) in pages {
        let mut operations = Vec::new();
        for (text, x, y, size) in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
            operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
