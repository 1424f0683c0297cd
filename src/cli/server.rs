use anyhow::{Context, anyhow};
use clap::Parser;
use log::{error, info};
use prometheus::{BasicAuthentication, labels};
use rand::distr::{Alphanumeric, SampleString};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tokio::time::{Duration, sleep};

use crate::cli::{SubCommandExtend, connect};
use crate::{Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// Bearer token required by every request, generated when empty
    #[arg(long, default_value_t = String::new())]
    pub token: String,
    /// Prometheus push gateway URL
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// Custom value of the instance label
    #[arg(long, value_name = "NAME")]
    pub prometheus_instance: Option<String>,
    /// Push gateway credentials, as username:password
    #[arg(long, value_name = "AUTH")]
    pub prometheus_auth: Option<String>,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let (store, embedder, index) = connect(opts)?;

        let mut token = self.token.clone();
        if token.is_empty() {
            token = Alphanumeric.sample_string(&mut rand::rng(), 32);
            info!("bearer token: {token}");
        }

        let state = server::AppState::new(store, embedder, index, token);
        let app = server::create_app(state);

        if let Some(url) = self.prometheus_push.clone() {
            let instance = self.prometheus_instance.clone().unwrap_or_else(|| self.addr.clone());
            let auth = match &self.prometheus_auth {
                Some(s) => {
                    let (username, password) = s
                        .split_once(':')
                        .ok_or_else(|| anyhow!("prometheus auth must be username:password"))?;
                    Some((username.to_string(), password.to_string()))
                }
                None => None,
            };
            tokio::spawn(push_metrics(url, instance, auth));
        }

        info!("listening on http://{}", &self.addr);
        let listener =
            TcpListener::bind(&self.addr).await.with_context(|| format!("failed to bind {}", self.addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn push_metrics(url: String, instance: String, auth: Option<(String, String)>) {
    loop {
        let metric_families = prometheus::gather();
        let url = url.clone();
        let instance = instance.clone();
        let auth = auth.clone();
        let r = spawn_blocking(move || {
            prometheus::push_metrics(
                "facesearch",
                labels! {
                    "instance".to_string() => instance,
                },
                &url,
                metric_families,
                auth.map(|(username, password)| BasicAuthentication { username, password }),
            )
        })
        .await;
        match r {
            Ok(Err(e)) => error!("failed to push metrics: {e}"),
            Err(e) => error!("metrics push task failed: {e}"),
            Ok(Ok(())) => {}
        }
        sleep(Duration::from_secs(30)).await;
    }
}
