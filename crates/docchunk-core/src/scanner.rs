//! Document discovery

use crate::error::{DocChunkError, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories to exclude from recursive scanning
const EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".cache",
    "__pycache__",
    ".venv",
    "target",
];

/// Scan options
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Pattern matched against each file name
    pub pattern: String,
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub exclude_dirs: Vec<String>,
    pub exclude_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: "*.pdf".to_string(),
            recursive: false,
            follow_symlinks: true,
            exclude_dirs: EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_hidden: true,
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &crate::config::ExtractionConfig) -> Self {
        Self {
            pattern: config.pattern.clone(),
            recursive: config.recursive,
            follow_symlinks: config.follow_symlinks,
            exclude_hidden: config.exclude_hidden,
            ..Self::default()
        }
    }
}

/// Find documents under `root` in lexicographic path order.
///
/// Non-recursive scans only look at the immediate children of `root`.
pub fn scan_documents(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(DocChunkError::InvalidInput(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let pattern = Pattern::new(&options.pattern)?;
    let match_options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
        .min_depth(1);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut documents = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| !should_skip(e, options))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if pattern.matches_with(&name, match_options) {
            documents.push(entry.into_path());
        }
    }

    documents.sort();
    Ok(documents)
}

fn should_skip(entry: &DirEntry, options: &ScanOptions) -> bool {
    let name = entry.file_name().to_string_lossy();

    if options.exclude_hidden && name.starts_with('.') {
        return true;
    }

    if entry.file_type().is_dir() && options.exclude_dirs.iter().any(|d| name == *d) {
        return true;
    }

    false
}
