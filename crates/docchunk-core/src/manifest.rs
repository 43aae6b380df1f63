//! Manifest persistence
//!
//! The manifest is a pretty-printed JSON array of chunks. It is written to a
//! temporary file beside the destination and renamed into place, so a reader
//! never observes a half-written manifest.

use crate::chunk::Chunk;
use crate::error::{DocChunkError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `chunks` to `path`, creating parent directories as needed.
///
/// Takes the collection by reference so a caller can retry with another
/// destination after `PersistenceFailed`.
pub fn save_manifest(chunks: &[Chunk], path: &Path) -> Result<()> {
    let persistence_failed = |source: std::io::Error| DocChunkError::PersistenceFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(persistence_failed)?;

    let mut file = NamedTempFile::new_in(parent).map_err(persistence_failed)?;
    serde_json::to_writer_pretty(&mut file, chunks)
        .map_err(|e| persistence_failed(e.into()))?;
    file.write_all(b"\n").map_err(persistence_failed)?;
    file.as_file().sync_all().map_err(persistence_failed)?;
    file.persist(path).map_err(|e| persistence_failed(e.error))?;

    tracing::info!("Saved {} chunks to {:?}", chunks.len(), path);
    Ok(())
}

/// Read a manifest written by [`save_manifest`]
pub fn load_manifest(path: &Path) -> Result<Vec<Chunk>> {
    if !path.exists() {
        return Err(DocChunkError::ManifestNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let chunks: Vec<Chunk> = serde_json::from_str(&content)?;
    Ok(chunks)
}

/// Chunk ids that occur more than once, in first-repeat order
pub fn duplicate_ids(chunks: &[Chunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for chunk in chunks {
        let id = chunk.metadata.chunk_id.as_str();
        if !seen.insert(id) && reported.insert(id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

/// Counts over a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestStats {
    pub total_chunks: usize,
    pub text_chunks: usize,
    pub image_chunks: usize,
    pub captioned_images: usize,
    pub sources: usize,
    pub pages: usize,
}

impl ManifestStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let sources: HashSet<&str> = chunks.iter().map(|c| c.metadata.source.as_str()).collect();
        let pages: HashSet<(&str, u32)> = chunks
            .iter()
            .map(|c| (c.metadata.source.as_str(), c.metadata.page))
            .collect();

        Self {
            total_chunks: chunks.len(),
            text_chunks: chunks.iter().filter(|c| c.is_text()).count(),
            image_chunks: chunks.iter().filter(|c| c.is_image()).count(),
            captioned_images: chunks.iter().filter(|c| c.is_captioned()).count(),
            sources: sources.len(),
            pages: pages.len(),
        }
    }
}
