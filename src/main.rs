//! shardplan - deployment planning wizard for sharded database clusters.
//!
//! ```bash
//! # Plan a cluster and render its scripts interactively
//! shardplan --action generate
//!
//! # Extend an existing deployment with a new shard
//! shardplan --action generate --add
//!
//! # Bring the whole cluster up, then tear it down
//! shardplan --action start,stop --component all
//! ```

use clap::Parser;
use std::path::PathBuf;

use shardplan_configs::WizardConfig;

mod args;
mod commands;
mod logging;
mod prompt;

use args::{Action, Cli};
use prompt::Prompt;

const DEFAULT_CONFIG_FILE: &str = "shardplan.toml";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = WizardConfig::load(&config_path)?;
    let mut prompt = Prompt::new(cli.non_interactive)?;

    for action in cli.actions.clone() {
        match action {
            Action::Generate => commands::generate::run(&cli, &mut config, &mut prompt)?,
            Action::Start => commands::start::run(&cli, &config)?,
            Action::Stop => commands::stop::run(&cli, &config)?,
        }
    }

    Ok(())
}
