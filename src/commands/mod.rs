pub mod generate;
pub mod start;
pub mod stop;

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

use shardplan_configs::WizardConfig;
use shardplan_scripts::ScriptEmitter;

use crate::args::Component;

/// Name of the aggregate script for one component and direction
/// (`up` or `down`).
fn aggregate_script(component: Component, config: &WizardConfig, direction: &str) -> String {
    let keyspace = &config.topology.keyspace;
    match component {
        Component::Lockserver => format!("lockserver-{}.sh", direction),
        Component::Admind => format!("admind-{}.sh", direction),
        Component::Gateway => format!("gateway-{}.sh", direction),
        Component::Tablet => format!("tablet-{}-{}.sh", keyspace, direction),
        Component::Mysqld => format!("mysqld-{}-{}.sh", keyspace, direction),
        Component::All => unreachable!("All is expanded before dispatch"),
    }
}

/// Runs the aggregate scripts for the given components, in order.
fn run_component_scripts(
    config: &WizardConfig,
    components: &[Component],
    direction: &str,
) -> Result<()> {
    let emitter = ScriptEmitter::new(&config.deployment.deployment_dir);
    for component in components {
        let script = emitter.resolve(aggregate_script(*component, config, direction));
        run_script(&script)?;
    }
    Ok(())
}

fn run_script(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "script {} not found; run the generate action first",
            path.display()
        );
    }
    info!(script = %path.display(), "running");
    let status = Command::new("bash")
        .arg(path)
        .status()
        .with_context(|| format!("failed to run {}", path.display()))?;
    if !status.success() {
        bail!("{} exited with {}", path.display(), status);
    }
    Ok(())
}
