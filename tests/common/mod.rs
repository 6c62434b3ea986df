//! Builders for small PDF fixtures.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const A4: [i64; 4] = [0, 0, 595, 842];

/// An image resource on the fixture page: (resource name, `/Filter`).
pub type ImageSpec = (&'static str, &'static str);

/// A one-page PDF showing `lines` in Helvetica and painting `images`.
pub fn pdf_with(lines: &[&str], media_box: [i64; 4], images: &[ImageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut operations = Vec::new();
    let mut xobjects = Dictionary::new();
    for (name, filter) in images {
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => Object::Name(filter.as_bytes().to_vec()),
            },
            vec![0u8; 4],
        ));
        xobjects.set(*name, Object::Reference(id));
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                Object::Integer(20),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(20),
                Object::Integer(10),
                Object::Integer(10),
            ],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        operations.push(Operation::new("Q", vec![]));
    }

    let mut y = media_box[3] - 60;
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(50), Object::Integer(y)],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
        y -= 20;
    }

    let content = Content { operations }.encode().unwrap();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            "XObject" => xobjects,
        },
        "Contents" => Object::Reference(content_id),
    });

    finish(doc, pages_id, vec![Object::Reference(page_id)])
}

/// A one-page A4 PDF showing `lines`.
pub fn text_pdf(lines: &[&str]) -> Vec<u8> {
    pdf_with(lines, A4, &[])
}

/// A structurally valid PDF with no pages.
pub fn empty_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    finish(doc, pages_id, Vec::new())
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId, kids: Vec<Object>) -> Vec<u8> {
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// The first page of a saved PDF and its document.
pub fn first_page(path: &Path) -> (Document, Dictionary) {
    let doc = Document::load(path).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap().clone();
    (doc, page)
}

/// `/Resources /XObject` of a page dictionary, dereferencing as needed.
pub fn xobjects(doc: &Document, page: &Dictionary) -> Dictionary {
    let deref = |obj: &Object| -> Dictionary {
        match obj {
            Object::Reference(id) => doc.get_dictionary(*id).unwrap().clone(),
            Object::Dictionary(d) => d.clone(),
            other => panic!("expected dictionary, got {:?}", other),
        }
    };
    let resources = deref(page.get(b"Resources").unwrap());
    deref(resources.get(b"XObject").unwrap())
}

/// Decoded operations of a page or form content stream.
pub fn operations(doc: &Document, id: lopdf::ObjectId) -> Vec<Operation> {
    let stream = match doc.get_object(id).unwrap() {
        Object::Stream(s) => s.clone(),
        other => panic!("expected stream, got {:?}", other),
    };
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Content::decode(&data).unwrap().operations
}
