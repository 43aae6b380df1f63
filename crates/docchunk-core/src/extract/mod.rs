//! Page extraction
//!
//! A [`DocumentParser`] opens one document and yields its pages lazily as
//! [`PageRecord`]s: the page's plain text plus one typed outcome per embedded
//! raster image. Extraction never writes to disk.

mod raster;
mod pdf;

pub use pdf::PdfParser;

use crate::error::Result;
use std::path::Path;

/// Raw bytes of one embedded image, in the encoding the parser reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Zero-based position in the page's image enumeration
    pub index: usize,
    pub bytes: Vec<u8>,
    /// File extension of the encoding (`jpeg`, `png`, `jpx`, ...)
    pub format: String,
}

/// An embedded image the parser could not hand over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub index: usize,
    pub reason: String,
}

/// Per-image extraction result
pub type ImageOutcome = std::result::Result<ExtractedImage, ImageFailure>;

/// One page of extracted content
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    /// 1-indexed page number
    pub page_number: u32,
    pub text: String,
    /// Images in enumeration order, failed ones keep their slot
    pub images: Vec<ImageOutcome>,
}

/// Lazy, single-pass sequence of pages for one document
pub type PageStream = Box<dyn Iterator<Item = PageRecord>>;

/// Document parser trait - opens a document and streams its pages
pub trait DocumentParser {
    /// Parser identifier (e.g., "pdf")
    fn parser_type(&self) -> &'static str;

    /// Whether this parser handles the file at `path`
    fn can_parse(&self, path: &Path) -> bool;

    /// Open a document; fails with `DocumentUnreadable` if it cannot be parsed at all
    fn open(&self, path: &Path) -> Result<PageStream>;
}
