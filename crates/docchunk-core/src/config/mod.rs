//! Configuration management

use crate::chunk::IdPageBase;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Extraction and chunking settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Vision captioning service settings
    #[serde(default)]
    pub caption: CaptionConfig,
}

/// Settings for the extraction-and-chunking pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Root of all pipeline output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where extracted images are written (defaults to `<output_dir>/images`)
    #[serde(default)]
    pub content_dir: Option<PathBuf>,

    /// Manifest destination (defaults to `<output_dir>/documents.json`)
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    /// File name pattern for documents
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Paragraphs at or below this many characters are dropped
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,

    /// Page numbering used inside chunk ids and image filenames
    #[serde(default)]
    pub id_page_base: IdPageBase,

    /// Skip dot-files and dot-directories
    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    #[serde(default = "default_true")]
    pub follow_symlinks: bool,
}

impl ExtractionConfig {
    /// Resolved content directory
    pub fn content_dir(&self) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("images"))
    }

    /// Resolved manifest path
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("documents.json"))
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: None,
            manifest_path: None,
            pattern: default_pattern(),
            recursive: false,
            min_paragraph_chars: default_min_paragraph_chars(),
            id_page_base: IdPageBase::default(),
            exclude_hidden: true,
            follow_symlinks: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_pattern() -> String {
    "*.pdf".to_string()
}

fn default_min_paragraph_chars() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Vision captioning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Base URL of the Messages API
    #[serde(default = "default_caption_url")]
    pub url: String,

    #[serde(default = "default_caption_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum in-flight caption requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Honour HTTP(S)_PROXY variables
    #[serde(default)]
    pub use_system_proxy: bool,

    /// API key (the CLI falls back to ANTHROPIC_API_KEY)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            url: default_caption_url(),
            model: default_caption_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
            use_system_proxy: false,
            api_key: None,
        }
    }
}

fn default_caption_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_caption_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    60
}

fn default_concurrency() -> usize {
    4
}

impl Config {
    /// Load config from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.extraction.pattern.trim().is_empty() {
            return Err(crate::DocChunkError::Config(
                "extraction.pattern must not be empty".to_string(),
            ));
        }
        glob::Pattern::new(&self.extraction.pattern)?;
        if self.caption.concurrency == 0 {
            return Err(crate::DocChunkError::Config(
                "caption.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
