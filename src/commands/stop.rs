use anyhow::Result;

use shardplan_configs::WizardConfig;

use crate::args::{Action, Cli, Component};

/// Stops the selected components in reverse dependency order.
pub fn run(cli: &Cli, config: &WizardConfig) -> Result<()> {
    let components = Component::resolve(&cli.components, Action::Stop);
    super::run_component_scripts(config, &components, "down")
}
