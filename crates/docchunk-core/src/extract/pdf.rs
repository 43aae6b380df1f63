//! PDF page extractor.
//!
//! Uses lopdf for page text and for walking each page's image XObjects.

use super::raster::decode_image;
use super::{DocumentParser, ExtractedImage, ImageFailure, ImageOutcome, PageRecord, PageStream};
use crate::error::{DocChunkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::btree_map;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Page tree and form nesting deeper than this is treated as malformed
const MAX_NESTING: usize = 32;

/// Parser for PDF files
pub struct PdfParser;

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfParser {
    /// Create a new PdfParser
    pub fn new() -> Self {
        Self
    }

    fn load_document(&self, path: &Path) -> Result<Document> {
        let unreadable = |reason: String| DocChunkError::DocumentUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let mut doc = Document::load(path).map_err(|e| unreadable(e.to_string()))?;
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|e| unreadable(format!("encrypted document: {}", e)))?;
        }
        Ok(doc)
    }
}

impl DocumentParser for PdfParser {
    fn parser_type(&self) -> &'static str {
        "pdf"
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    fn open(&self, path: &Path) -> Result<PageStream> {
        let doc = self.load_document(path)?;
        let pages = doc.get_pages();
        debug!("Opened {:?} ({} pages)", path, pages.len());

        Ok(Box::new(PdfPages {
            doc,
            pages: pages.into_iter(),
            path: path.to_path_buf(),
        }))
    }
}

/// Lazily extracts one page at a time from a loaded document
struct PdfPages {
    doc: Document,
    pages: btree_map::IntoIter<u32, ObjectId>,
    path: PathBuf,
}

impl Iterator for PdfPages {
    type Item = PageRecord;

    fn next(&mut self) -> Option<PageRecord> {
        let (page_number, page_id) = self.pages.next()?;

        let text = match self.doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Failed to extract text from page {} of {:?}: {}",
                    page_number, self.path, e
                );
                String::new()
            }
        };

        let images = match page_xobjects(&self.doc, page_id) {
            Ok(Some(xobjects)) => {
                let mut outcomes = Vec::new();
                let mut seen = HashSet::new();
                collect_images(&self.doc, xobjects, 0, &mut seen, &mut outcomes);
                outcomes
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    "Failed to read image resources of page {} of {:?}: {}",
                    page_number, self.path, e
                );
                Vec::new()
            }
        };

        debug!(
            "Page {} of {:?}: {} chars, {} images",
            page_number,
            self.path,
            text.len(),
            images.len()
        );

        Some(PageRecord {
            page_number,
            text,
            images,
        })
    }
}

/// Follow a single indirect reference
pub(crate) fn resolve<'a>(
    doc: &'a Document,
    object: &'a Object,
) -> std::result::Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// The page's XObject dictionary, inheriting Resources from ancestors
fn page_xobjects(
    doc: &Document,
    page_id: ObjectId,
) -> std::result::Result<Option<&Dictionary>, lopdf::Error> {
    let mut node = doc.get_dictionary(page_id)?;

    for _ in 0..MAX_NESTING {
        if let Ok(resources) = node.get(b"Resources") {
            let resources = resolve(doc, resources)?.as_dict()?;
            return xobject_dict(doc, resources);
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }

    Ok(None)
}

fn xobject_dict<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
) -> std::result::Result<Option<&'a Dictionary>, lopdf::Error> {
    match resources.get(b"XObject") {
        Ok(xobjects) => Ok(Some(resolve(doc, xobjects)?.as_dict()?)),
        Err(_) => Ok(None),
    }
}

/// Enumerate image XObjects in dictionary order, descending into forms.
///
/// Every image gets a slot, including ones that fail to decode; an object
/// referenced more than once on a page is listed once.
fn collect_images(
    doc: &Document,
    xobjects: &Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<ImageOutcome>,
) {
    if depth >= MAX_NESTING {
        return;
    }

    for (name, value) in xobjects.iter() {
        if let Object::Reference(id) = value {
            if !seen.insert(*id) {
                continue;
            }
        }

        // An entry whose Subtype cannot be read is not known to be an image
        let stream = match resolve(doc, value).and_then(Object::as_stream) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    "Ignoring unresolvable XObject /{}: {}",
                    String::from_utf8_lossy(name),
                    e
                );
                continue;
            }
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                let index = out.len();
                let outcome = decode_image(doc, stream)
                    .map(|(bytes, format)| ExtractedImage {
                        index,
                        bytes,
                        format,
                    })
                    .map_err(|reason| ImageFailure { index, reason });
                out.push(outcome);
            }
            Ok(b"Form") => {
                if let Ok(Some(nested)) = stream
                    .dict
                    .get(b"Resources")
                    .and_then(|r| resolve(doc, r))
                    .and_then(Object::as_dict)
                    .and_then(|r| xobject_dict(doc, r))
                {
                    collect_images(doc, nested, depth + 1, seen, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};
    use tempfile::TempDir;

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
            vec![0xFF, 0xD8, 0xFF, 0xD9],
        )
    }

    fn broken_stream() -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "LZWDecode",
            },
            vec![0; 4],
        )
    }

    /// One page whose Resources carry the given image XObjects
    fn write_pdf(dir: &Path, text: &str, images: Vec<Stream>) -> PathBuf {
        write_pdf_with(dir, text, |doc| {
            let mut xobjects = Dictionary::new();
            for (i, image) in images.into_iter().enumerate() {
                let id = doc.add_object(image);
                xobjects.set(format!("Im{}", i), id);
            }
            xobjects
        })
    }

    /// One page whose XObject dictionary is built by `xobjects`
    fn write_pdf_with<F>(dir: &Path, text: &str, xobjects: F) -> PathBuf
    where
        F: FnOnce(&mut Document) -> Dictionary,
    {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let xobjects = xobjects(&mut doc);

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join("sample.pdf");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_parser_type_and_extension() {
        let parser = PdfParser::new();
        assert_eq!(parser.parser_type(), "pdf");
        assert!(parser.can_parse(Path::new("a/b/Report.PDF")));
        assert!(!parser.can_parse(Path::new("notes.md")));
    }

    #[test]
    fn test_unreadable_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        match PdfParser::new().open(&path) {
            Err(DocChunkError::DocumentUnreadable { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected DocumentUnreadable"),
        }
    }

    #[test]
    fn test_pages_and_images() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(
            dir.path(),
            "Pressure relief valves protect the separator.",
            vec![jpeg_stream(), jpeg_stream()],
        );

        let pages: Vec<PageRecord> = PdfParser::new().open(&path).unwrap().collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert!(pages[0].text.contains("Pressure relief valves"));

        let images: Vec<&ExtractedImage> =
            pages[0].images.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].index, 0);
        assert_eq!(images[1].index, 1);
        assert_eq!(images[0].format, "jpeg");
        assert_eq!(images[0].bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_failed_image_keeps_its_slot() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(
            dir.path(),
            "Page with one good and one broken image.",
            vec![broken_stream(), jpeg_stream()],
        );

        let pages: Vec<PageRecord> = PdfParser::new().open(&path).unwrap().collect();
        let images = &pages[0].images;
        assert_eq!(images.len(), 2);

        let failure = images[0].as_ref().unwrap_err();
        assert_eq!(failure.index, 0);
        assert!(failure.reason.contains("LZWDecode"));

        let ok = images[1].as_ref().unwrap();
        assert_eq!(ok.index, 1);
    }

    #[test]
    fn test_dangling_xobject_takes_no_slot() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf_with(dir.path(), "Page with a dangling XObject.", |doc| {
            let jpeg_id = doc.add_object(jpeg_stream());
            let mut xobjects = Dictionary::new();
            xobjects.set("Fm0", Object::Reference((9999, 0)));
            xobjects.set("Im0", jpeg_id);
            xobjects
        });

        let pages: Vec<PageRecord> = PdfParser::new().open(&path).unwrap().collect();
        let images = &pages[0].images;
        assert_eq!(images.len(), 1);
        let image = images[0].as_ref().unwrap();
        assert_eq!(image.index, 0);
        assert_eq!(image.format, "jpeg");
    }
}
