//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docchunk")]
#[command(
    author,
    version,
    about = "Turn a directory of PDFs into a manifest of text and image chunks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "DOCCHUNK_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract text and image chunks from a directory of PDFs
    Extract(ExtractArgs),

    /// Caption the image chunks of a manifest with a vision model
    Caption(CaptionArgs),

    /// Show counts for a saved manifest
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Directory containing the documents
    pub dir: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Manifest file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for extracted images
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Drop paragraphs with this many characters or fewer
    #[arg(long)]
    pub min_chars: Option<usize>,

    /// File name pattern to match
    #[arg(long)]
    pub pattern: Option<String>,

    /// Use 1-based page numbers in chunk ids and image names
    #[arg(long)]
    pub one_based_ids: bool,
}

#[derive(Args)]
pub struct CaptionArgs {
    /// Manifest produced by `extract`
    pub manifest: PathBuf,

    /// Where to write the captioned manifest (default: <stem>_captioned.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Vision model
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum concurrent caption requests
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Caption at most this many images
    #[arg(long)]
    pub limit: Option<usize>,

    /// Caption images that already have a caption
    #[arg(long)]
    pub recaption: bool,

    /// API key for the caption service
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Manifest to inspect
    pub manifest: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}
