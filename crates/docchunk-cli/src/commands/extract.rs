//! Extract command

use crate::app::{ExtractArgs, OutputFormat};
use crate::progress::ProgressReporter;
use anyhow::Result;
use docchunk_core::{
    save_manifest, BatchStatus, BuilderOptions, ChunkBuilder, Config, DocumentOutcome,
    IdPageBase, RunSummary, ScanOptions, SkippedImage,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SkippedDocument {
    path: String,
    reason: String,
}

#[derive(Serialize)]
struct ExtractOutput {
    manifest: String,
    #[serde(flatten)]
    summary: RunSummary,
    skipped_documents: Vec<SkippedDocument>,
    skipped_images: Vec<SkippedImage>,
}

fn apply_overrides(args: &ExtractArgs, config: &mut Config) {
    let extraction = &mut config.extraction;
    if args.recursive {
        extraction.recursive = true;
    }
    if let Some(ref output) = args.output {
        extraction.manifest_path = Some(output.clone());
    }
    if let Some(ref content_dir) = args.content_dir {
        extraction.content_dir = Some(content_dir.clone());
    }
    if let Some(min_chars) = args.min_chars {
        extraction.min_paragraph_chars = min_chars;
    }
    if let Some(ref pattern) = args.pattern {
        extraction.pattern = pattern.clone();
    }
    if args.one_based_ids {
        extraction.id_page_base = IdPageBase::One;
    }
}

pub async fn run(args: ExtractArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    apply_overrides(&args, &mut config);
    config.validate()?;

    let scan = ScanOptions::from_config(&config.extraction);
    let builder = ChunkBuilder::new(BuilderOptions::from_config(&config.extraction));
    let manifest_path = config.extraction.manifest_path();

    let mut progress = ProgressReporter::new(0, matches!(format, OutputFormat::Cli));
    let batch = builder.process_directory(&args.dir, &scan, |_, total, report| {
        progress.set_total(total);
        progress.increment();
        progress.set_message(&report.path.display().to_string());
    })?;
    progress.finish();

    save_manifest(&batch.chunks, &manifest_path)?;

    let output = ExtractOutput {
        manifest: manifest_path.display().to_string(),
        summary: batch.summary(&builder.options().content_dir),
        skipped_documents: batch
            .documents
            .iter()
            .filter_map(|d| match &d.outcome {
                DocumentOutcome::Unreadable { reason } => Some(SkippedDocument {
                    path: d.path.display().to_string(),
                    reason: reason.clone(),
                }),
                DocumentOutcome::Processed { .. } => None,
            })
            .collect(),
        skipped_images: batch
            .documents
            .iter()
            .flat_map(|d| d.skipped_images().iter().cloned())
            .collect(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => print_summary(&args.dir, &output),
    }
    Ok(())
}

fn print_summary(dir: &Path, output: &ExtractOutput) {
    let summary = &output.summary;
    if summary.status == BatchStatus::NoDocuments {
        println!("No PDF documents found in {}", dir.display());
        println!("Wrote empty manifest to {}", output.manifest);
        return;
    }

    println!("Manifest:        {}", output.manifest);
    println!("Images:          {}", summary.content_dir);
    println!();
    println!("Documents:");
    println!("  Found:         {}", summary.documents_found);
    println!("  Processed:     {}", summary.documents_processed);
    println!("  Skipped:       {}", summary.documents_skipped);
    println!();
    println!("Chunks:          {}", summary.total_chunks);
    println!("  Text:          {}", summary.text_chunks);
    println!("  Image:         {}", summary.image_chunks);
    println!("  Images skipped: {}", summary.images_skipped);

    if !output.skipped_documents.is_empty() {
        println!();
        println!("Skipped documents:");
        for doc in &output.skipped_documents {
            println!("  {}: {}", doc.path, doc.reason);
        }
    }
    if !output.skipped_images.is_empty() {
        println!();
        println!("Skipped images:");
        for image in &output.skipped_images {
            println!(
                "  {} page {} image {}: {}",
                image.source, image.page, image.index, image.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> ExtractArgs {
        ExtractArgs {
            dir: PathBuf::from("docs"),
            recursive: false,
            output: None,
            content_dir: None,
            min_chars: None,
            pattern: None,
            one_based_ids: false,
        }
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        apply_overrides(&args(), &mut config);
        assert_eq!(
            config.extraction.manifest_path(),
            PathBuf::from("data/processed/documents.json")
        );
        assert_eq!(config.extraction.min_paragraph_chars, 10);
        assert_eq!(config.extraction.id_page_base, IdPageBase::Zero);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = ExtractArgs {
            recursive: true,
            output: Some(PathBuf::from("out/manifest.json")),
            content_dir: Some(PathBuf::from("out/img")),
            min_chars: Some(20),
            pattern: Some("*.PDF".to_string()),
            one_based_ids: true,
            ..args()
        };
        apply_overrides(&args, &mut config);

        assert!(config.extraction.recursive);
        assert_eq!(
            config.extraction.manifest_path(),
            PathBuf::from("out/manifest.json")
        );
        assert_eq!(config.extraction.content_dir(), PathBuf::from("out/img"));
        assert_eq!(config.extraction.min_paragraph_chars, 20);
        assert_eq!(config.extraction.pattern, "*.PDF");
        assert_eq!(config.extraction.id_page_base, IdPageBase::One);
    }
}
