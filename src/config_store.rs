use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::ValueEnum;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 6333;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("failed to build regex"));

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentKind {
    Docker,
    Cloud,
}

/// How to reach the vector index service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSettings {
    #[serde(rename = "type")]
    pub kind: DeploymentKind,
    pub url: String,
    pub api_key: Option<String>,
    pub port: Option<u16>,
}

impl DeploymentSettings {
    /// Local container listening on `port`
    pub fn docker(port: u16) -> Result<Self> {
        if port < 1024 {
            return Err(Error::InvalidSettings(format!(
                "port must be between 1024 and 65535, got {port}"
            )));
        }
        Ok(Self {
            kind: DeploymentKind::Docker,
            url: format!("http://localhost:{port}"),
            api_key: None,
            port: Some(port),
        })
    }

    /// Hosted instance, requires an API key
    pub fn cloud(url: &str, api_key: &str) -> Result<Self> {
        let url = url.trim();
        let api_key = api_key.trim();
        if url.is_empty() {
            return Err(Error::InvalidSettings("URL cannot be empty".to_string()));
        }
        if !URL_RE.is_match(url) {
            return Err(Error::InvalidSettings(format!("invalid URL format: {url}")));
        }
        if api_key.is_empty() {
            return Err(Error::InvalidSettings("API key cannot be empty".to_string()));
        }
        Ok(Self {
            kind: DeploymentKind::Cloud,
            url: url.to_string(),
            api_key: Some(api_key.to_string()),
            port: None,
        })
    }
}

/// The whole persisted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub deployment: Option<DeploymentSettings>,
    /// folder identifier => collection identifier
    #[serde(default)]
    pub collections: BTreeMap<String, String>,
}

/// Durable settings and folder => collection mapping.
///
/// Every mutation rewrites the whole document. There is no locking, the last
/// writer wins.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Open the store at `path`, reading the current document if any
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self { path, config: Config::default() };
        store.config = store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached copy of the last loaded or saved document
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the persisted document, the default one if the file is absent
    pub fn load(&self) -> Result<Config> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no configuration at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(self.unavailable(e)),
        };
        serde_json::from_slice(&data).map_err(|e| self.unavailable(e.into()))
    }

    /// Atomically persist `config`, the cache is only updated on success
    pub fn save(&mut self, config: Config) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(&config).map_err(|e| self.unavailable(e.into()))?;
        data.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &data).map_err(|e| self.unavailable(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.unavailable(e))?;

        self.config = config;
        Ok(())
    }

    pub fn deployment(&self) -> Option<&DeploymentSettings> {
        self.config.deployment.as_ref()
    }

    /// Like [`Self::deployment`] but fails when setup has not run yet
    pub fn require_deployment(&self) -> Result<&DeploymentSettings> {
        self.deployment().ok_or(Error::NotConfigured)
    }

    pub fn set_deployment(&mut self, settings: DeploymentSettings) -> Result<()> {
        let mut config = self.config.clone();
        info!("deployment set to {:?} at {}", settings.kind, settings.url);
        config.deployment = Some(settings);
        self.save(config)
    }

    pub fn get_collection_for(&self, folder_id: &str) -> Option<&str> {
        self.config.collections.get(folder_id).map(String::as_str)
    }

    /// Bind `folder_id` to `collection_id`, replacing any previous binding
    pub fn set_collection_for(&mut self, folder_id: &str, collection_id: &str) -> Result<()> {
        let mut config = self.config.clone();
        if let Some(old) = config.collections.insert(folder_id.to_string(), collection_id.to_string())
        {
            if old != collection_id {
                info!("{folder_id} moved from collection {old} to {collection_id}");
            }
        }
        self.save(config)
    }

    /// Reverse lookup, the folder currently bound to `collection_id`
    pub fn folder_for(&self, collection_id: &str) -> Option<&str> {
        self.config
            .collections
            .iter()
            .find(|(_, collection)| *collection == collection_id)
            .map(|(folder, _)| folder.as_str())
    }

    pub fn is_bound(&self, collection_id: &str) -> bool {
        self.folder_for(collection_id).is_some()
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.config.collections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn unavailable(&self, source: io::Error) -> Error {
        Error::StorageUnavailable { path: self.path.clone(), source }
    }
}
