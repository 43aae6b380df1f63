//! Image captioning pass
//!
//! Iterates the image chunks of a manifest, asks a vision model to describe
//! each image, and merges the description into the chunk. The stored image
//! reference moves to `metadata.image_path`; text chunks are never touched.

mod anthropic;

pub use anthropic::{media_type_for, AnthropicCaptioner};

use crate::chunk::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Vision captioning service
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Model used for captions
    fn model_name(&self) -> &str;

    /// Describe the image at `image_path`; `context` is free text such as the source document
    async fn caption(&self, image_path: &Path, context: &str) -> Result<String>;
}

/// Caption pass settings
#[derive(Debug, Clone)]
pub struct CaptionOptions {
    /// Maximum in-flight requests
    pub concurrency: usize,
    /// Caption at most this many images
    pub limit: Option<usize>,
    /// Caption images that already carry a caption
    pub recaption: bool,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            limit: None,
            recaption: false,
        }
    }
}

/// An image chunk whose caption request failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionFailure {
    pub chunk_id: String,
    pub image_path: String,
    pub reason: String,
}

/// Outcome of a caption pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptionReport {
    pub captioned: usize,
    pub already_captioned: usize,
    pub failures: Vec<CaptionFailure>,
}

/// Context line handed to the captioner for one chunk
pub fn caption_context(chunk: &Chunk) -> String {
    format!(
        "Source document: {}, page {}",
        chunk.metadata.source, chunk.metadata.page
    )
}

/// Caption image chunks in place, preserving manifest order
pub async fn caption_chunks(
    chunks: &mut [Chunk],
    captioner: &dyn Captioner,
    options: &CaptionOptions,
) -> CaptionReport {
    let mut report = CaptionReport::default();

    let mut targets = Vec::new();
    for (position, chunk) in chunks.iter().enumerate() {
        let Some(reference) = chunk.image_reference() else {
            continue;
        };
        if chunk.is_captioned() && !options.recaption {
            report.already_captioned += 1;
            continue;
        }
        targets.push((position, reference.to_string(), caption_context(chunk)));
    }
    if let Some(limit) = options.limit {
        targets.truncate(limit);
    }

    info!(
        "Captioning {} images with {} ({} concurrent)",
        targets.len(),
        captioner.model_name(),
        options.concurrency.max(1)
    );

    let mut results: Vec<_> = stream::iter(targets)
        .map(|(position, reference, context)| async move {
            let result = captioner.caption(Path::new(&reference), &context).await;
            (position, reference, result)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(position, _, _)| *position);

    for (position, reference, result) in results {
        let chunk = &mut chunks[position];
        match result {
            Ok(caption) => {
                chunk.metadata.image_path = Some(reference);
                chunk.content = caption;
                report.captioned += 1;
            }
            Err(e) => {
                warn!(
                    "Failed to caption {} ({}): {}",
                    chunk.metadata.chunk_id, reference, e
                );
                report.failures.push(CaptionFailure {
                    chunk_id: chunk.metadata.chunk_id.clone(),
                    image_path: reference,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
