//! Stats command

use crate::app::{OutputFormat, StatsArgs};
use anyhow::Result;
use docchunk_core::{duplicate_ids, load_manifest, ManifestStats};
use serde::Serialize;

#[derive(Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    stats: ManifestStats,
    duplicate_ids: Vec<String>,
}

pub async fn run(args: StatsArgs, format: OutputFormat) -> Result<()> {
    let chunks = load_manifest(&args.manifest)?;
    let output = StatsOutput {
        stats: ManifestStats::from_chunks(&chunks),
        duplicate_ids: duplicate_ids(&chunks),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            let stats = &output.stats;
            println!("Chunks:          {}", stats.total_chunks);
            println!("  Text:          {}", stats.text_chunks);
            println!("  Image:         {}", stats.image_chunks);
            println!("  Captioned:     {}", stats.captioned_images);
            println!();
            println!("Sources:         {}", stats.sources);
            println!("Pages:           {}", stats.pages);
            if !output.duplicate_ids.is_empty() {
                println!();
                println!("Duplicate ids:");
                for id in &output.duplicate_ids {
                    println!("  {}", id);
                }
            }
        }
    }
    Ok(())
}
