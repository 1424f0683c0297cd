use std::collections::BTreeMap;

use anyhow::Result;
use clap::Parser;

use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::Opts;
use crate::config_store::ConfigStore;

#[derive(Parser, Debug, Clone)]
pub struct CollectionsCommand {
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for CollectionsCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = ConfigStore::open(opts.conf_dir.config())?;
        match self.output_format {
            OutputFormat::Json => {
                let mapping = store.collections().collect::<BTreeMap<_, _>>();
                println!("{}", serde_json::to_string_pretty(&mapping)?);
            }
            OutputFormat::Table => {
                for (folder, collection) in store.collections() {
                    println!("{collection}\t{folder}");
                }
            }
        }
        Ok(())
    }
}
