//! Docchunk Core Library
//!
//! Turns a directory of PDF documents into a JSON manifest of retrieval
//! chunks for a multimodal RAG index.
//!
//! # Features
//! - Page-by-page text and embedded-image extraction with lopdf
//! - Paragraph chunking with stable, deterministic chunk ids
//! - Per-document and per-image failure isolation with a batch report
//! - Atomic manifest persistence
//! - Vision-model captioning of image chunks

pub mod builder;
pub mod caption;
pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod report;
pub mod scanner;

pub use builder::{split_paragraphs, BuilderOptions, ChunkBuilder, DocumentChunks};
pub use caption::{
    caption_chunks, AnthropicCaptioner, CaptionFailure, CaptionOptions, CaptionReport, Captioner,
};
pub use chunk::{Chunk, ChunkIdScheme, ChunkMetadata, ChunkType, IdPageBase, SourceNames};
pub use config::{CaptionConfig, Config, ExtractionConfig};
pub use error::{DocChunkError, Error, Result};
pub use extract::{DocumentParser, ExtractedImage, ImageFailure, PageRecord, PdfParser};
pub use manifest::{duplicate_ids, load_manifest, save_manifest, ManifestStats};
pub use report::{Batch, BatchStatus, DocumentOutcome, DocumentReport, RunSummary, SkippedImage};
pub use scanner::{scan_documents, ScanOptions};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "docchunk";
