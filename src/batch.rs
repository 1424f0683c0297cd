use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indicatif::ProgressBar;
use log::{info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::embedder::FaceEmbeddingProvider;
use crate::error::{Error, Result};
use crate::metrics;
use crate::types::{BatchResult, FileError, ImageSource};

/// Image extensions picked up by default
pub const DEFAULT_SUFFIX: &str = "png,jpg,jpeg";

static DEFAULT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| suffix_regex(DEFAULT_SUFFIX).expect("failed to build regex"));

/// Build a case-insensitive extension matcher from a comma separated list
pub fn suffix_regex(suffix: &str) -> Result<Regex, regex::Error> {
    let alternatives = suffix
        .split(',')
        .map(|s| s.trim().trim_start_matches('.'))
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)^({alternatives})$"))
}

/// Runs the embedding provider over every image of a folder.
///
/// A file that cannot be embedded is recorded and skipped, only a missing or
/// unreadable folder aborts the batch.
pub struct EmbeddingBatchProcessor<'a, E> {
    embedder: &'a E,
    suffix: Regex,
    pb: ProgressBar,
}

impl<'a, E: FaceEmbeddingProvider> EmbeddingBatchProcessor<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self { embedder, suffix: DEFAULT_SUFFIX_RE.clone(), pb: ProgressBar::hidden() }
    }

    pub fn with_suffix(mut self, suffix: Regex) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| self.suffix.is_match(&ext.to_string_lossy()))
    }

    /// Image files directly inside `folder`, in directory listing order.
    ///
    /// Entries with an image extension that cannot be stat'ed (dangling links,
    /// permission errors) are returned as failures instead of being skipped.
    pub fn list_images(&self, folder: &Path) -> Result<(Vec<PathBuf>, Vec<FileError>)> {
        if !folder.is_dir() {
            return Err(Error::FolderNotFound(folder.to_path_buf()));
        }

        let mut images = vec![];
        let mut unreadable = vec![];
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(Error::FolderNotFound(folder.to_path_buf())),
                Err(e) => {
                    warn!("unreadable entry in {}: {}", folder.display(), e);
                    if let Some(file) = e.path().filter(|p| self.is_image(p)).and_then(file_name) {
                        unreadable.push(FileError { file, reason: e.to_string() });
                    }
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_image(entry.path()) {
                images.push(entry.into_path());
            }
        }
        Ok((images, unreadable))
    }

    pub async fn process_folder(&self, folder: &Path) -> Result<BatchResult> {
        let (images, unreadable) = self.list_images(folder)?;
        info!("found {} image(s) in {}", images.len() + unreadable.len(), folder.display());
        self.pb.set_length(images.len() as u64);

        let mut result = BatchResult::default();
        for FileError { file, reason } in unreadable {
            result.push_error(&file, reason);
        }
        for path in images {
            let Some(filename) = file_name(&path) else {
                continue;
            };
            self.pb.set_message(filename.clone());

            match self.embedder.detect_and_embed(&ImageSource::Path(path)).await {
                Ok(faces) if faces.is_empty() => {
                    warn!("no faces detected in {filename}");
                    result.push_error(&filename, "no faces detected");
                }
                Ok(faces) => result.push_faces(&filename, faces),
                Err(e) => {
                    warn!("failed to process {filename}: {e}");
                    result.push_error(&filename, e.to_string());
                }
            }
            self.pb.inc(1);
        }

        metrics::inc_ingest_images(result.stats.processed, result.stats.failed);
        info!(
            "{}: {} image(s) processed, {} failed, {} face(s)",
            folder.display(),
            result.stats.processed,
            result.stats.failed,
            result.embeddings.len()
        );
        Ok(result)
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
