use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::{OutputFormat, SubCommandExtend, connect};
use crate::config::Opts;
use crate::search::{SearchRequest, SearchService, SearchTarget};
use crate::types::{HitLocation, ImageSource, SearchOutcome, SearchResults};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// Image containing the face to look for
    pub image: PathBuf,
    /// Collection to search
    #[arg(long, conflicts_with = "folder", required_unless_present = "folder")]
    pub collection: Option<String>,
    /// Search the collection bound to this folder
    #[arg(long)]
    pub folder: Option<String>,
    /// Number of matches to return, at most 100
    #[arg(short = 'n', long, default_value_t = 5)]
    pub limit: usize,
    /// Also store the query face in the searched collection
    #[arg(long)]
    pub store_query: bool,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let (store, embedder, index) = connect(opts)?;

        let target = match (&self.collection, &self.folder) {
            (Some(collection), _) => SearchTarget::Collection(collection.clone()),
            (None, Some(folder)) => SearchTarget::Folder(folder.clone()),
            (None, None) => unreachable!("clap requires --collection or --folder"),
        };
        let store_query_as = self
            .store_query
            .then(|| self.image.file_name().map(|n| n.to_string_lossy().into_owned()))
            .flatten();

        let request = SearchRequest {
            target,
            image: ImageSource::Path(self.image.clone()),
            limit: self.limit,
            store_query_as,
        };
        let results = SearchService::new(&embedder, &index).search(&store, request).await?;

        print_result(&results, self.output_format)
    }
}

fn print_result(results: &SearchResults, format: OutputFormat) -> Result<()> {
    if let Some(e) = &results.query_store_error {
        eprintln!("failed to store the query face: {e}");
    }
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Table => match &results.outcome {
            SearchOutcome::NoFaceDetected => eprintln!("no faces detected in the query image"),
            SearchOutcome::Matches(hits) if hits.is_empty() => eprintln!("no similar faces found"),
            SearchOutcome::Matches(hits) => {
                for hit in hits {
                    let location = match &hit.location {
                        HitLocation::Resolved(path) => path.display().to_string(),
                        HitLocation::Missing(path) => format!("(missing) {}", path.display()),
                        HitLocation::Unmapped => "(no folder bound)".to_string(),
                    };
                    println!("{}\t{:.4}\t{}\t{}", hit.rank, hit.score, hit.source_image, location);
                }
            }
        },
    }
    Ok(())
}
