//! PDF fixtures built with lopdf

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of one generated page
pub struct PageSpec<'a> {
    /// Each paragraph is drawn as its own text block, separated by a blank block
    pub paragraphs: Vec<&'a str>,
    /// Number of 1x1 JPEG images placed in the page resources
    pub jpegs: usize,
}

impl<'a> PageSpec<'a> {
    pub fn text(paragraphs: Vec<&'a str>) -> Self {
        Self {
            paragraphs,
            jpegs: 0,
        }
    }

    pub fn with_jpegs(mut self, jpegs: usize) -> Self {
        self.jpegs = jpegs;
        self
    }
}

fn jpeg_stream() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0xFF, 0xD9],
    )
}

fn text_block(text: &str, y: i64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Write a PDF with the given pages to `path`
pub fn write_pdf(path: &Path, pages: &[PageSpec]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let mut operations = Vec::new();
        let mut y = 760;
        for (i, paragraph) in spec.paragraphs.iter().enumerate() {
            if i > 0 {
                operations.extend(text_block(" ", y));
                y -= 14;
            }
            operations.extend(text_block(paragraph, y));
            y -= 14;
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut xobjects = Dictionary::new();
        for i in 0..spec.jpegs {
            let image_id = doc.add_object(jpeg_stream());
            xobjects.set(format!("Im{}", i), image_id);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    doc.save(path).unwrap();
    path.to_path_buf()
}

/// A file with a `.pdf` name that is not a PDF
pub fn write_corrupt(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"this is not a pdf document").unwrap();
    path.to_path_buf()
}
