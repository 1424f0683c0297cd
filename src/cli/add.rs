use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;

use crate::batch::{DEFAULT_SUFFIX, suffix_regex};
use crate::cli::{OutputFormat, SubCommandExtend, connect};
use crate::config::Opts;
use crate::ingest::{IngestionPipeline, ReingestPolicy};
use crate::types::IngestionReport;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// Folder containing the face images
    pub path: PathBuf,
    /// Extensions to scan, separated by commas
    #[arg(short, long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
    /// What to do when the folder was already added
    #[arg(long, value_enum, default_value_t = ReingestPolicy::Fresh)]
    pub policy: ReingestPolicy,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let (mut store, embedder, index) = connect(opts)?;
        let suffix = suffix_regex(&self.suffix)?;

        let pb = ProgressBar::no_length().with_style(pb_style());
        let report = IngestionPipeline::new(&embedder, &index)
            .with_policy(self.policy)
            .with_suffix(suffix)
            .with_progress(pb.clone())
            .ingest(&mut store, &self.path)
            .await;
        pb.finish_and_clear();

        print_report(&report?, self.output_format)
    }
}

fn print_report(report: &IngestionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Table => {
            println!("Collection:        {}", report.collection_id);
            println!("Folder:            {}", report.folder);
            println!("Images processed:  {}", report.processed);
            println!("Processing errors: {}", report.failed);
            println!("Embeddings stored: {}", report.stored);
            println!("Storage errors:    {}", report.store_errors);
            for e in &report.detection_failures {
                println!("[SKIP] {}: {}", e.file, e.reason);
            }
            for e in &report.store_failures {
                println!("[ERR] {}: {}", e.file, e.reason);
            }
        }
    }
    Ok(())
}
