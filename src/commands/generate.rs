//! The planning wizard: prompts for topology, proposes placements,
//! commits the plan, and renders deployment scripts.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use shardplan_commons::HostName;
use shardplan_configs::{PlanStore, WizardConfig};
use shardplan_planner::{ClusterPlan, RoleCounts, ShardId, TabletRecord, TopologyPlanner};
use shardplan_scripts::{ScriptEmitter, ScriptSet};

use crate::args::{Action, Cli, Component};
use crate::prompt::Prompt;

pub fn run(cli: &Cli, config: &mut WizardConfig, prompt: &mut Prompt) -> Result<()> {
    prompt_topology(config, prompt)?;

    let store = PlanStore::new(&config.deployment.deployment_dir);
    let mut plan = store.load().map_err(|e| anyhow!("{}", e))?;
    if !plan.shards().is_empty() {
        info!(
            shards = plan.shards().len(),
            tablets = plan.tablets().len(),
            "loaded existing plan"
        );
    }

    let planner = TopologyPlanner::new(config.planner_config().map_err(|e| anyhow!("{}", e))?)
        .map_err(|e| anyhow!("{}", e))?;
    let new_shards = prompt_shards(cli, config, &planner, &plan, prompt)?;

    if new_shards.is_empty() {
        println!("{}", "No new shards to place.".yellow());
    } else {
        let counts = prompt_role_counts(&new_shards, prompt)?;
        let hosts = prompt_tablet_hosts(config, prompt)?;
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut records = planner
            .propose(&plan, &new_shards, &counts, &hosts, &mut rng)
            .map_err(|e| anyhow!("{}", e))?;
        review_placement(&mut records, prompt)?;
        planner
            .commit(&mut plan, new_shards, records)
            .map_err(|e| anyhow!("{}", e))?;
        store.save(&plan).map_err(|e| anyhow!("{}", e))?;
        info!(path = %store.path().display(), "plan saved");
    }

    emit_scripts(cli, config, &plan)
}

/// Prompts for the topology settings, writing answers back into the
/// config so later actions in the same run see them.
fn prompt_topology(config: &mut WizardConfig, prompt: &mut Prompt) -> Result<()> {
    config.topology.cell = prompt.read_value("Cell name", &config.topology.cell)?;
    config.topology.keyspace = prompt.read_value("Keyspace name", &config.topology.keyspace)?;
    config.deployment.deployment_dir =
        prompt.read_value("Deployment directory", &config.deployment.deployment_dir)?;
    config.deployment.data_dir =
        prompt.read_value("Data directory", &config.deployment.data_dir)?;
    Ok(())
}

/// Determines the shards to add. With `--add` the operator names new
/// shard ranges directly; otherwise the keyspace is re-partitioned and
/// the shards missing from the stored plan are added.
fn prompt_shards(
    cli: &Cli,
    config: &WizardConfig,
    planner: &TopologyPlanner,
    plan: &ClusterPlan,
    prompt: &mut Prompt,
) -> Result<Vec<ShardId>> {
    if cli.add {
        let answer = prompt.read_value("New shard ranges (comma separated)", "")?;
        return Ok(answer
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ShardId::from)
            .collect());
    }

    let default = plan.shards().len().max(2) as u64;
    let num_shards = prompt.read_number("Number of shards", default)?;
    let partition = planner
        .partition(num_shards as usize)
        .map_err(|e| anyhow!("{}", e))?;

    println!(
        "{} {} over keyspace {}",
        "Shards:".bold(),
        partition
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
            .cyan(),
        config.topology.keyspace
    );

    Ok(partition
        .into_iter()
        .filter(|s| !plan.shards().contains(s))
        .collect())
}

/// One role-count prompt, applied to every new shard. The master count
/// is fixed at one per shard.
fn prompt_role_counts(
    new_shards: &[ShardId],
    prompt: &mut Prompt,
) -> Result<HashMap<ShardId, RoleCounts>> {
    let defaults = RoleCounts::default();
    let replica = prompt.read_number("Replica tablets per shard", defaults.replica as u64)?;
    let rdonly = prompt.read_number("Read-only tablets per shard", defaults.rdonly as u64)?;
    let counts = RoleCounts {
        master: 1,
        replica: replica as u32,
        rdonly: rdonly as u32,
    };
    Ok(new_shards.iter().map(|s| (s.clone(), counts)).collect())
}

fn prompt_tablet_hosts(config: &mut WizardConfig, prompt: &mut Prompt) -> Result<Vec<HostName>> {
    let default = if config.hosts.tablet.is_empty() {
        vec!["localhost".to_string()]
    } else {
        config.hosts.tablet.clone()
    };
    config.hosts.tablet = prompt.read_hosts("Tablet hosts (or file:<path>)", &default)?;
    let hosts = config.tablet_hosts();
    if hosts.is_empty() {
        return Err(anyhow!("at least one tablet host is required"));
    }
    Ok(hosts)
}

/// Shows the proposed placement and lets the operator accept it or
/// override each tablet's host, ports and mysql location.
fn review_placement(records: &mut [TabletRecord], prompt: &mut Prompt) -> Result<()> {
    loop {
        print_placement(records);
        if prompt.confirm("Accept placement? (n to edit)", true)? {
            return Ok(());
        }
        for record in records.iter_mut() {
            edit_record(record, prompt)?;
        }
    }
}

/// One per-tablet editing pass. Every derived value is offered back as
/// the default; moving the tablet also moves its mysqld, and a mysql
/// host differing from the tablet host defaults the mysql port to the
/// standard 3306.
fn edit_record(record: &mut TabletRecord, prompt: &mut Prompt) -> Result<()> {
    let label = format!("{} ({} {})", record.alias, record.shard, record.role);

    let host = prompt.read_value(&format!("Host for {}", label), record.host.as_str())?;
    if host != record.host.as_str() {
        record.host = HostName::from(host.as_str());
        record.mysql_host = record.host.clone();
    }

    record.web_port =
        prompt.read_number(&format!("Web port for {}", label), record.web_port as u64)? as u32;
    record.grpc_port =
        prompt.read_number(&format!("Grpc port for {}", label), record.grpc_port as u64)? as u32;

    let mysql_host = prompt.read_value(
        &format!("Mysql host for {}", label),
        record.mysql_host.as_str(),
    )?;
    if mysql_host != record.mysql_host.as_str() {
        record.mysql_host = HostName::from(mysql_host.as_str());
    }
    record.mysql_port = prompt.read_number(
        &format!("Mysql port for {}", label),
        record.default_mysql_port() as u64,
    )? as u32;
    Ok(())
}

fn print_placement(records: &[TabletRecord]) {
    println!();
    println!(
        "{:<22} {:<8} {:<8} {:<16} {:>7} {:>7} {:>7}",
        "ALIAS".bold(),
        "SHARD".bold(),
        "TYPE".bold(),
        "HOST".bold(),
        "WEB".bold(),
        "GRPC".bold(),
        "MYSQL".bold()
    );
    for r in records {
        println!(
            "{:<22} {:<8} {:<8} {:<16} {:>7} {:>7} {:>7}",
            r.alias.to_string().cyan(),
            r.shard.as_str(),
            r.init_type().to_string(),
            r.host.as_str(),
            r.web_port,
            r.grpc_port,
            r.mysql_port
        );
    }
    println!();
}

fn emit_scripts(cli: &Cli, config: &WizardConfig, plan: &ClusterPlan) -> Result<()> {
    let set = ScriptSet::new(config).map_err(|e| anyhow!("{}", e))?;
    let components = Component::resolve(&cli.components, Action::Generate);

    let mut scripts = vec![set.run_helper()];
    for component in &components {
        match component {
            Component::Lockserver => scripts.extend(set.lockserver()),
            Component::Admind => scripts.extend(set.admind()),
            Component::Gateway => scripts.extend(set.gateway()),
            Component::Tablet => scripts.extend(set.tablet(plan)),
            Component::Mysqld => scripts.extend(set.mysqld(plan)),
            Component::All => {}
        }
    }

    let emitter = ScriptEmitter::new(&config.deployment.deployment_dir);
    let written = emitter
        .write_all(&scripts)
        .map_err(|e| anyhow!("{}", e))
        .context("failed to write deployment scripts")?;
    println!(
        "{} {} scripts under {}",
        "Wrote".green(),
        written.len(),
        emitter.bin_dir().display()
    );
    Ok(())
}
