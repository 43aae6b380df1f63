//! Batch outcomes and run summaries

use crate::chunk::Chunk;
use crate::error::DocChunkError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Why an image was left out of the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// The parser could not decode the image
    Extraction,
    /// The bytes could not be written to the content directory
    Write,
}

/// An image that produced no chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    pub source: String,
    pub page: u32,
    pub index: usize,
    pub kind: SkipKind,
    pub reason: String,
}

impl SkippedImage {
    pub fn to_error(&self) -> DocChunkError {
        DocChunkError::ImageExtractionFailed {
            source_id: self.source.clone(),
            page: self.page,
            index: self.index,
            reason: self.reason.clone(),
        }
    }
}

/// Result of processing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Processed {
        pages: u32,
        text_chunks: usize,
        image_chunks: usize,
        skipped_images: Vec<SkippedImage>,
    },
    Unreadable {
        reason: String,
    },
}

/// Per-document entry of a batch report
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub source: String,
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn is_unreadable(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Unreadable { .. })
    }

    pub fn skipped_images(&self) -> &[SkippedImage] {
        match &self.outcome {
            DocumentOutcome::Processed { skipped_images, .. } => skipped_images,
            DocumentOutcome::Unreadable { .. } => &[],
        }
    }
}

/// Overall state of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Discovery found nothing to process
    NoDocuments,
    Completed,
    /// Some documents or images were skipped
    CompletedWithSkips,
}

/// Chunks and per-document reports of one run, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub chunks: Vec<Chunk>,
    pub documents: Vec<DocumentReport>,
}

impl Batch {
    pub fn status(&self) -> BatchStatus {
        if self.documents.is_empty() {
            BatchStatus::NoDocuments
        } else if self.documents_skipped() > 0 || self.images_skipped() > 0 {
            BatchStatus::CompletedWithSkips
        } else {
            BatchStatus::Completed
        }
    }

    pub fn text_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_text()).count()
    }

    pub fn image_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_image()).count()
    }

    pub fn documents_skipped(&self) -> usize {
        self.documents.iter().filter(|d| d.is_unreadable()).count()
    }

    pub fn images_skipped(&self) -> usize {
        self.documents.iter().map(|d| d.skipped_images().len()).sum()
    }

    pub fn summary(&self, content_dir: &Path) -> RunSummary {
        RunSummary {
            status: self.status(),
            documents_found: self.documents.len(),
            documents_processed: self.documents.len() - self.documents_skipped(),
            documents_skipped: self.documents_skipped(),
            total_chunks: self.chunks.len(),
            text_chunks: self.text_chunks(),
            image_chunks: self.image_chunks(),
            images_skipped: self.images_skipped(),
            content_dir: content_dir.display().to_string(),
        }
    }
}

/// User-facing counts for one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub status: BatchStatus,
    pub documents_found: usize,
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub total_chunks: usize,
    pub text_chunks: usize,
    pub image_chunks: usize,
    pub images_skipped: usize,
    pub content_dir: String,
}
