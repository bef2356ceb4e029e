use anyhow::Result;

use shardplan_configs::WizardConfig;

use crate::args::{Action, Cli, Component};

/// Starts the selected components in dependency order.
pub fn run(cli: &Cli, config: &WizardConfig) -> Result<()> {
    let components = Component::resolve(&cli.components, Action::Start);
    super::run_component_scripts(config, &components, "up")
}
