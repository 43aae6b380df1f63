//! Error types for docchunk

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using DocChunkError
pub type Result<T> = std::result::Result<T, DocChunkError>;

/// Error type alias for convenience
pub type Error = DocChunkError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const PERSISTENCE_FAILED: i32 = 4;
}

/// Main error type for docchunk
#[derive(Debug, Error)]
pub enum DocChunkError {
    #[error("Document unreadable {path:?}: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("Image {index} on page {page} of {source_id} could not be extracted: {reason}")]
    ImageExtractionFailed {
        source_id: String,
        page: u32,
        index: usize,
        reason: String,
    },

    #[error("Failed to persist manifest to {path:?}: {source}")]
    PersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Caption service error: {0}")]
    Caption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DocChunkError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ManifestNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) | Self::GlobPattern(_) => {
                exit_codes::INVALID_INPUT
            }
            Self::PersistenceFailed { .. } => exit_codes::PERSISTENCE_FAILED,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
