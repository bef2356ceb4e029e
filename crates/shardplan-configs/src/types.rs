//! Wizard configuration types.
//!
//! Parsed from `shardplan.toml`. Every field has a default so a missing
//! file still yields a usable local-demo configuration; environment
//! overrides are applied separately by the loader.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use shardplan_commons::{CellName, HostName, KeyspaceName, Result};
use shardplan_planner::{KeySpace, PlannerConfig};

/// Complete wizard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WizardConfig {
    #[serde(default)]
    pub deployment: DeploymentSettings,
    #[serde(default)]
    pub topology: TopologySettings,
    #[serde(default)]
    pub ports: PortsSettings,
    #[serde(default)]
    pub hosts: HostsSettings,
}

/// Filesystem layout of the generated deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSettings {
    /// Root directory for generated scripts and configs.
    #[serde(default = "default_deployment_dir")]
    pub deployment_dir: String,

    /// Data root on the target hosts (mysql data, logs).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Backup directory on the target hosts. Empty = `<data_dir>/backups`.
    #[serde(default)]
    pub backup_dir: String,

    /// Root of the mysql installation on the target hosts.
    #[serde(default = "default_mysql_root")]
    pub mysql_root: String,
}

/// Topology planning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySettings {
    #[serde(default = "default_cell")]
    pub cell: String,

    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Key width in bytes (key space size = 2^(8 * num_bytes)).
    #[serde(default = "default_num_bytes")]
    pub num_bytes: u32,

    /// Spacing between consecutive shards' tablet id blocks.
    #[serde(default = "default_offset_base")]
    pub offset_base: u64,

    /// Starting value of the per-shard tablet counter.
    #[serde(default)]
    pub tablet_id_offset: u64,
}

/// Base port numbers per component type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortsSettings {
    #[serde(default = "default_tablet_web")]
    pub tablet_web: u32,
    #[serde(default = "default_tablet_grpc")]
    pub tablet_grpc: u32,
    #[serde(default = "default_tablet_mysql")]
    pub tablet_mysql: u32,

    #[serde(default = "default_gateway_web")]
    pub gateway_web: u32,
    #[serde(default = "default_gateway_grpc")]
    pub gateway_grpc: u32,
    #[serde(default = "default_gateway_mysql_server")]
    pub gateway_mysql_server: u32,

    #[serde(default = "default_admin_web")]
    pub admin_web: u32,
    #[serde(default = "default_admin_grpc")]
    pub admin_grpc: u32,

    #[serde(default = "default_lockserver_leader")]
    pub lockserver_leader: u32,
    #[serde(default = "default_lockserver_election")]
    pub lockserver_election: u32,
    #[serde(default = "default_lockserver_client")]
    pub lockserver_client: u32,
}

/// Configured host pools per component, order-preserving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostsSettings {
    #[serde(default)]
    pub tablet: Vec<String>,
    #[serde(default)]
    pub gateway: Vec<String>,
    #[serde(default)]
    pub admin: Vec<String>,
    #[serde(default)]
    pub lockserver: Vec<String>,
}

impl WizardConfig {
    /// Builds the planner configuration from the topology and port
    /// sections. Fails on an invalid cell or keyspace name.
    pub fn planner_config(&self) -> Result<PlannerConfig> {
        let cell = CellName::new(self.topology.cell.clone())?;
        let keyspace = KeyspaceName::new(self.topology.keyspace.clone())?;
        let mut config = PlannerConfig::new(cell, keyspace);
        config.key_space = KeySpace::new(self.topology.num_bytes)?;
        config.offset_base = self.topology.offset_base;
        config.id_offset = self.topology.tablet_id_offset;
        config.base_web_port = self.ports.tablet_web;
        config.base_grpc_port = self.ports.tablet_grpc;
        config.base_mysql_port = self.ports.tablet_mysql;
        config.validate()?;
        Ok(config)
    }

    /// Tablet host pool, deduplicated, input order preserved.
    pub fn tablet_hosts(&self) -> Vec<HostName> {
        dedup(&self.hosts.tablet)
    }

    pub fn gateway_hosts(&self) -> Vec<HostName> {
        dedup(&self.hosts.gateway)
    }

    pub fn admin_hosts(&self) -> Vec<HostName> {
        dedup(&self.hosts.admin)
    }

    pub fn lockserver_hosts(&self) -> Vec<HostName> {
        dedup(&self.hosts.lockserver)
    }

    /// Effective backup dir (defaults under the data dir).
    pub fn backup_dir(&self) -> String {
        if self.deployment.backup_dir.is_empty() {
            format!("{}/backups", self.deployment.data_dir)
        } else {
            self.deployment.backup_dir.clone()
        }
    }
}

fn dedup(hosts: &[String]) -> Vec<HostName> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .filter(|h| !h.is_empty() && seen.insert(h.as_str()))
        .map(|h| HostName::from(h.as_str()))
        .collect()
}

// Default value functions for serde

fn default_deployment_dir() -> String {
    "./cluster-deployment".to_string()
}

fn default_data_dir() -> String {
    "./vtdata".to_string()
}

fn default_mysql_root() -> String {
    "/usr".to_string()
}

fn default_cell() -> String {
    "uswest".to_string()
}

fn default_keyspace() -> String {
    "messagedb".to_string()
}

fn default_num_bytes() -> u32 {
    1
}

fn default_offset_base() -> u64 {
    100
}

fn default_tablet_web() -> u32 {
    15100
}

fn default_tablet_grpc() -> u32 {
    16100
}

fn default_tablet_mysql() -> u32 {
    17100
}

fn default_gateway_web() -> u32 {
    15001
}

fn default_gateway_grpc() -> u32 {
    15991
}

fn default_gateway_mysql_server() -> u32 {
    15306
}

fn default_admin_web() -> u32 {
    15000
}

fn default_admin_grpc() -> u32 {
    15999
}

fn default_lockserver_leader() -> u32 {
    28881
}

fn default_lockserver_election() -> u32 {
    38881
}

fn default_lockserver_client() -> u32 {
    21811
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            deployment_dir: default_deployment_dir(),
            data_dir: default_data_dir(),
            backup_dir: String::new(),
            mysql_root: default_mysql_root(),
        }
    }
}

impl Default for TopologySettings {
    fn default() -> Self {
        Self {
            cell: default_cell(),
            keyspace: default_keyspace(),
            num_bytes: default_num_bytes(),
            offset_base: default_offset_base(),
            tablet_id_offset: 0,
        }
    }
}

impl Default for PortsSettings {
    fn default() -> Self {
        Self {
            tablet_web: default_tablet_web(),
            tablet_grpc: default_tablet_grpc(),
            tablet_mysql: default_tablet_mysql(),
            gateway_web: default_gateway_web(),
            gateway_grpc: default_gateway_grpc(),
            gateway_mysql_server: default_gateway_mysql_server(),
            admin_web: default_admin_web(),
            admin_grpc: default_admin_grpc(),
            lockserver_leader: default_lockserver_leader(),
            lockserver_election: default_lockserver_election(),
            lockserver_client: default_lockserver_client(),
        }
    }
}
