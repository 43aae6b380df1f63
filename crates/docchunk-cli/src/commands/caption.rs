//! Caption command

use crate::app::{CaptionArgs, OutputFormat};
use anyhow::Result;
use docchunk_core::{
    caption_chunks, load_manifest, save_manifest, AnthropicCaptioner, CaptionOptions,
    CaptionReport, Config,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct CaptionOutput {
    manifest: String,
    model: String,
    #[serde(flatten)]
    report: CaptionReport,
}

/// `<dir>/<stem>_captioned.json` beside the input manifest
fn captioned_path(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "documents".to_string());
    manifest.with_file_name(format!("{}_captioned.json", stem))
}

pub async fn run(args: CaptionArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    if let Some(model) = args.model {
        config.caption.model = model;
    }
    if let Some(concurrency) = args.concurrency {
        config.caption.concurrency = concurrency;
    }
    if args.api_key.is_some() {
        config.caption.api_key = args.api_key;
    }
    config.validate()?;

    let mut chunks = load_manifest(&args.manifest)?;
    let output_path = args
        .output
        .unwrap_or_else(|| captioned_path(&args.manifest));

    let captioner = AnthropicCaptioner::new(config.caption.clone())?;
    let options = CaptionOptions {
        concurrency: config.caption.concurrency,
        limit: args.limit,
        recaption: args.recaption,
    };

    if matches!(format, OutputFormat::Cli) {
        eprintln!(
            "Captioning images from {} with {}",
            args.manifest.display(),
            config.caption.model
        );
    }
    let report = caption_chunks(&mut chunks, &captioner, &options).await;
    save_manifest(&chunks, &output_path)?;

    let output = CaptionOutput {
        manifest: output_path.display().to_string(),
        model: config.caption.model,
        report,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            println!("Manifest:          {}", output.manifest);
            println!("Captioned:         {}", output.report.captioned);
            println!("Already captioned: {}", output.report.already_captioned);
            println!("Failed:            {}", output.report.failures.len());
            for failure in &output.report.failures {
                println!("  {}: {}", failure.chunk_id, failure.reason);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captioned_path() {
        assert_eq!(
            captioned_path(Path::new("data/processed/documents.json")),
            PathBuf::from("data/processed/documents_captioned.json")
        );
        assert_eq!(
            captioned_path(Path::new("manifest.json")),
            PathBuf::from("manifest_captioned.json")
        );
    }
}
