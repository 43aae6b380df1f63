//! Chunk records and the identifier scheme
//!
//! A chunk is one retrievable unit: a paragraph of page text or a reference
//! to an image extracted from a page. Field names serialize exactly as they
//! appear in the manifest.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of content a chunk carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Image,
}

/// Provenance of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating document identifier (file stem)
    pub source: String,

    /// 1-indexed page number
    pub page: u32,

    pub chunk_id: String,

    /// Original image reference, set once a caption replaces `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// A retrievable unit of text or image content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,

    /// Paragraph text, or the path of the stored image
    pub content: String,

    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn text(content: String, source: &str, page: u32, chunk_id: String) -> Self {
        Self {
            chunk_type: ChunkType::Text,
            content,
            metadata: ChunkMetadata {
                source: source.to_string(),
                page,
                chunk_id,
                image_path: None,
            },
        }
    }

    pub fn image(path: String, source: &str, page: u32, chunk_id: String) -> Self {
        Self {
            chunk_type: ChunkType::Image,
            content: path,
            metadata: ChunkMetadata {
                source: source.to_string(),
                page,
                chunk_id,
                image_path: None,
            },
        }
    }

    pub fn is_text(&self) -> bool {
        self.chunk_type == ChunkType::Text
    }

    pub fn is_image(&self) -> bool {
        self.chunk_type == ChunkType::Image
    }

    /// Whether a caption has been merged into this image chunk
    pub fn is_captioned(&self) -> bool {
        self.is_image() && self.metadata.image_path.is_some()
    }

    /// Location of the stored image bytes, before or after captioning
    pub fn image_reference(&self) -> Option<&str> {
        if !self.is_image() {
            return None;
        }
        Some(
            self.metadata
                .image_path
                .as_deref()
                .unwrap_or(self.content.as_str()),
        )
    }
}

/// Page numbering used inside chunk ids and image filenames
///
/// `metadata.page` is always 1-indexed; only the identifier segment varies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPageBase {
    /// `p0` for the first page
    #[default]
    Zero,
    /// `p1` for the first page
    One,
}

/// Derives chunk ids and image filenames from chunk coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkIdScheme {
    page_base: IdPageBase,
}

impl ChunkIdScheme {
    pub fn new(page_base: IdPageBase) -> Self {
        Self { page_base }
    }

    fn page_segment(&self, page_number: u32) -> u32 {
        match self.page_base {
            IdPageBase::Zero => page_number.saturating_sub(1),
            IdPageBase::One => page_number,
        }
    }

    /// `<source>_p<page>_text_<seq>`
    pub fn text_id(&self, source: &str, page_number: u32, seq: usize) -> String {
        format!("{}_p{}_text_{}", source, self.page_segment(page_number), seq)
    }

    /// `<source>_p<page>_img<index>`
    pub fn image_id(&self, source: &str, page_number: u32, index: usize) -> String {
        format!("{}_p{}_img{}", source, self.page_segment(page_number), index)
    }

    /// `<source>_p<page>_img<index>.<ext>`
    pub fn image_filename(&self, source: &str, page_number: u32, index: usize, ext: &str) -> String {
        format!("{}.{}", self.image_id(source, page_number, index), ext)
    }
}

/// Hands out source identifiers that are unique within one run
///
/// The first document with a given stem keeps it; later ones get `<stem>_<n>`
/// with the smallest unclaimed `n >= 2`. Claims follow discovery order, so the
/// assignment is deterministic.
#[derive(Debug, Default)]
pub struct SourceNames {
    claimed: HashSet<String>,
}

impl SourceNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, stem: &str) -> String {
        if self.claimed.insert(stem.to_string()) {
            return stem.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}_{}", stem, n);
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names() {
        let chunk = Chunk::text(
            "Longer paragraph here".to_string(),
            "manual",
            1,
            "manual_p0_text_0".to_string(),
        );
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "text",
                "content": "Longer paragraph here",
                "metadata": {
                    "source": "manual",
                    "page": 1,
                    "chunk_id": "manual_p0_text_0"
                }
            })
        );
    }

    #[test]
    fn test_image_path_only_serialized_after_caption() {
        let mut chunk = Chunk::image(
            "images/manual_p0_img0.png".to_string(),
            "manual",
            1,
            "manual_p0_img0".to_string(),
        );
        assert!(!serde_json::to_string(&chunk).unwrap().contains("image_path"));
        assert_eq!(chunk.image_reference(), Some("images/manual_p0_img0.png"));

        chunk.metadata.image_path = Some(chunk.content.clone());
        chunk.content = "A centrifugal pump".to_string();
        assert!(chunk.is_captioned());
        assert_eq!(chunk.image_reference(), Some("images/manual_p0_img0.png"));
    }

    #[test]
    fn test_zero_based_ids() {
        let scheme = ChunkIdScheme::default();
        assert_eq!(scheme.text_id("report", 1, 0), "report_p0_text_0");
        assert_eq!(scheme.image_id("report", 3, 2), "report_p2_img2");
        assert_eq!(
            scheme.image_filename("report", 1, 1, "jpeg"),
            "report_p0_img1.jpeg"
        );
    }

    #[test]
    fn test_one_based_ids() {
        let scheme = ChunkIdScheme::new(IdPageBase::One);
        assert_eq!(scheme.text_id("report", 1, 4), "report_p1_text_4");
        assert_eq!(scheme.image_filename("report", 2, 0, "png"), "report_p2_img0.png");
    }

    #[test]
    fn test_source_names_disambiguate_duplicates() {
        let mut names = SourceNames::new();
        assert_eq!(names.claim("report"), "report");
        assert_eq!(names.claim("report_2"), "report_2");
        assert_eq!(names.claim("report"), "report_3");
        assert_eq!(names.claim("manual"), "manual");
        assert_eq!(names.claim("report"), "report_4");
    }
}
