//! Chunk building
//!
//! Drives a [`DocumentParser`] over each discovered document and turns its
//! page records into chunks. Per page, every surviving paragraph becomes a
//! text chunk, then every image becomes an image chunk; text always precedes
//! the page's images in the output.
//!
//! Documents are processed one at a time in discovery order. The builder is
//! the only writer of the content directory.

use crate::chunk::{Chunk, ChunkIdScheme, SourceNames};
use crate::config::ExtractionConfig;
use crate::error::{DocChunkError, Result};
use crate::extract::{DocumentParser, ExtractedImage, PageRecord, PdfParser};
use crate::report::{Batch, DocumentOutcome, DocumentReport, SkipKind, SkippedImage};
use crate::scanner::{scan_documents, ScanOptions};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

lazy_static! {
    /// A newline, any run of whitespace, and another newline
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
}

/// Default minimum paragraph length; paragraphs at or below it are dropped
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 10;

/// Split page text into trimmed paragraphs longer than `min_chars` characters
pub fn split_paragraphs(text: &str, min_chars: usize) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| p.chars().count() > min_chars)
        .collect()
}

/// Chunk builder settings
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub content_dir: PathBuf,
    pub min_paragraph_chars: usize,
    pub id_scheme: ChunkIdScheme,
}

impl BuilderOptions {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            id_scheme: ChunkIdScheme::default(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            content_dir: config.content_dir(),
            min_paragraph_chars: config.min_paragraph_chars,
            id_scheme: ChunkIdScheme::new(config.id_page_base),
        }
    }
}

/// Chunks produced from one document
#[derive(Debug, Clone, Default)]
pub struct DocumentChunks {
    pub chunks: Vec<Chunk>,
    pub pages: u32,
    pub skipped_images: Vec<SkippedImage>,
}

/// Turns documents into chunk records
pub struct ChunkBuilder<P: DocumentParser = PdfParser> {
    parser: P,
    options: BuilderOptions,
}

impl ChunkBuilder<PdfParser> {
    /// Create a builder for PDF documents
    pub fn new(options: BuilderOptions) -> Self {
        Self::with_parser(PdfParser::new(), options)
    }
}

impl<P: DocumentParser> ChunkBuilder<P> {
    pub fn with_parser(parser: P, options: BuilderOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Discover documents under `root` and process them in order.
    ///
    /// Only a failure to scan `root` is an error; unreadable documents are
    /// recorded in the batch and skipped.
    pub fn process_directory<F>(&self, root: &Path, scan: &ScanOptions, on_document: F) -> Result<Batch>
    where
        F: FnMut(usize, usize, &DocumentReport),
    {
        let paths = scan_documents(root, scan)?;
        if paths.is_empty() {
            info!("No documents matching {:?} found in {:?}", scan.pattern, root);
        } else {
            info!("Found {} documents in {:?}", paths.len(), root);
        }
        Ok(self.process_paths(&paths, on_document))
    }

    /// Process documents in the given order.
    ///
    /// `on_document` is called after each document with its position, the
    /// total count and its report.
    pub fn process_paths<F>(&self, paths: &[PathBuf], mut on_document: F) -> Batch
    where
        F: FnMut(usize, usize, &DocumentReport),
    {
        let mut names = SourceNames::new();
        let mut batch = Batch::default();

        for (position, path) in paths.iter().enumerate() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "document".to_string());
            let source = names.claim(&stem);

            let outcome = match self.process_document(path, &source) {
                Ok(document) => {
                    let text_chunks = document.chunks.iter().filter(|c| c.is_text()).count();
                    let image_chunks = document.chunks.len() - text_chunks;
                    info!(
                        "{:?}: {} text chunks, {} images",
                        path, text_chunks, image_chunks
                    );
                    batch.chunks.extend(document.chunks);
                    DocumentOutcome::Processed {
                        pages: document.pages,
                        text_chunks,
                        image_chunks,
                        skipped_images: document.skipped_images,
                    }
                }
                Err(e) => {
                    warn!("Skipping document {:?}: {}", path, e);
                    DocumentOutcome::Unreadable {
                        reason: e.to_string(),
                    }
                }
            };

            let report = DocumentReport {
                path: path.clone(),
                source,
                outcome,
            };
            on_document(position + 1, paths.len(), &report);
            batch.documents.push(report);
        }

        batch
    }

    /// Chunk a single document under the given source identifier
    pub fn process_document(&self, path: &Path, source: &str) -> Result<DocumentChunks> {
        if !self.parser.can_parse(path) {
            return Err(DocChunkError::DocumentUnreadable {
                path: path.to_path_buf(),
                reason: format!("not a {} document", self.parser.parser_type()),
            });
        }
        let pages = self.parser.open(path)?;
        let mut document = DocumentChunks::default();

        for page in pages {
            document.pages += 1;
            self.process_page(source, page, &mut document);
        }

        Ok(document)
    }

    fn process_page(&self, source: &str, page: PageRecord, document: &mut DocumentChunks) {
        let scheme = &self.options.id_scheme;
        let page_number = page.page_number;

        // Text pass
        let paragraphs = split_paragraphs(&page.text, self.options.min_paragraph_chars);
        debug!(
            "{} page {}: {} paragraphs kept",
            source,
            page_number,
            paragraphs.len()
        );
        for (seq, paragraph) in paragraphs.into_iter().enumerate() {
            document.chunks.push(Chunk::text(
                paragraph.to_string(),
                source,
                page_number,
                scheme.text_id(source, page_number, seq),
            ));
        }

        // Image pass
        for outcome in page.images {
            let skipped = match outcome {
                Ok(image) => match self.store_image(source, page_number, &image) {
                    Ok(reference) => {
                        document.chunks.push(Chunk::image(
                            reference,
                            source,
                            page_number,
                            scheme.image_id(source, page_number, image.index),
                        ));
                        continue;
                    }
                    Err(e) => SkippedImage {
                        source: source.to_string(),
                        page: page_number,
                        index: image.index,
                        kind: SkipKind::Write,
                        reason: e.to_string(),
                    },
                },
                Err(failure) => SkippedImage {
                    source: source.to_string(),
                    page: page_number,
                    index: failure.index,
                    kind: SkipKind::Extraction,
                    reason: failure.reason,
                },
            };

            warn!("Skipping image: {}", skipped.to_error());
            document.skipped_images.push(skipped);
        }
    }

    /// Write image bytes to the content directory and return the reference
    fn store_image(&self, source: &str, page_number: u32, image: &ExtractedImage) -> Result<String> {
        let filename = self.options.id_scheme.image_filename(
            source,
            page_number,
            image.index,
            &image.format,
        );
        if filename.contains(['/', '\\']) {
            return Err(DocChunkError::InvalidInput(format!(
                "image filename {:?} would leave the content directory",
                filename
            )));
        }

        fs::create_dir_all(&self.options.content_dir)?;
        let path = self.options.content_dir.join(filename);
        fs::write(&path, &image.bytes)?;
        Ok(path.to_string_lossy().to_string())
    }
}
