use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::config_store::{ConfigStore, DEFAULT_PORT, DeploymentKind, DeploymentSettings};
use crate::utils::read_line;

const MAX_ATTEMPTS: usize = 3;

#[derive(Parser, Debug, Clone)]
pub struct SetupCommand {
    /// Deployment type, asked interactively when omitted
    #[arg(long, value_enum)]
    pub kind: Option<DeploymentKind>,
    /// Port of the local container (docker)
    #[arg(long)]
    pub port: Option<u16>,
    /// URL of the hosted instance (cloud)
    #[arg(long)]
    pub url: Option<String>,
    /// API key of the hosted instance (cloud)
    #[arg(long)]
    pub api_key: Option<String>,
}

impl SubCommandExtend for SetupCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let mut store = ConfigStore::open(opts.conf_dir.config())?;
        let settings = self.settings()?;
        store.set_deployment(settings)?;
        info!("configuration saved to {}", store.path().display());
        Ok(())
    }
}

impl SetupCommand {
    fn settings(&self) -> Result<DeploymentSettings> {
        let kind = match self.kind {
            Some(kind) => kind,
            None => prompt_kind()?,
        };
        let from_flags = match kind {
            DeploymentKind::Docker => self.port.is_some(),
            DeploymentKind::Cloud => self.url.is_some() && self.api_key.is_some(),
        };

        for _ in 0..MAX_ATTEMPTS {
            let attempt = match kind {
                DeploymentKind::Docker => {
                    let port = match self.port {
                        Some(port) => port,
                        None => {
                            let input = read_line(&format!(
                                "Enter port number (default: {DEFAULT_PORT}): "
                            ))?;
                            if input.is_empty() {
                                DEFAULT_PORT
                            } else {
                                match input.parse() {
                                    Ok(port) => port,
                                    Err(e) => {
                                        eprintln!("Invalid port number: {e}");
                                        continue;
                                    }
                                }
                            }
                        }
                    };
                    DeploymentSettings::docker(port)
                }
                DeploymentKind::Cloud => {
                    let url = match &self.url {
                        Some(url) => url.clone(),
                        None => read_line("Enter Qdrant cloud URL: ")?,
                    };
                    let api_key = match &self.api_key {
                        Some(key) => key.clone(),
                        None => read_line("Enter API key: ")?,
                    };
                    DeploymentSettings::cloud(&url, &api_key)
                }
            };
            match attempt {
                Ok(settings) => return Ok(settings),
                Err(e) if from_flags => return Err(e.into()),
                Err(e) => eprintln!("{e}"),
            }
        }
        bail!("too many invalid attempts")
    }
}

fn prompt_kind() -> Result<DeploymentKind> {
    for _ in 0..MAX_ATTEMPTS {
        match read_line("Choose deployment type (docker/cloud): ")?.to_lowercase().as_str() {
            "docker" => return Ok(DeploymentKind::Docker),
            "cloud" => return Ok(DeploymentKind::Cloud),
            _ => eprintln!("Invalid choice. Please enter 'docker' or 'cloud'"),
        }
    }
    bail!("too many invalid attempts")
}
