use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs =
        ProjectDirs::from("", "facesearch", "facesearch").expect("failed to get project dir");
    ConfDir { path: proj_dirs.config_dir().to_path_buf() }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "facesearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// facesearch configuration directory
    #[arg(short, long, global = true, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
    /// URL of the face embedding service
    #[arg(long, value_name = "URL", global = true, default_value = "http://127.0.0.1:8500/embed")]
    pub embedder: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Configure how to reach the vector database
    Setup(SetupCommand),
    /// Embed the faces of a folder into a new collection
    Add(AddCommand),
    /// Search faces similar to an image
    Search(SearchCommand),
    /// List folder to collection bindings
    Collections(CollectionsCommand),
    /// Start the HTTP search service
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Path of the persisted settings and mapping
    pub fn config(&self) -> PathBuf {
        self.path.join("config.json")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
