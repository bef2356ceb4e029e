//! Lockserver quorum strings and topology flags.
//!
//! Every component script needs the same three flags to find the
//! topology service; they are derived once from the configured lockserver
//! hosts and base ports.

use shardplan_commons::{CellName, HostName, PlanError, Result};
use shardplan_configs::PortsSettings;

/// One lockserver instance: host plus its three ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockserverInstance {
    pub host: HostName,
    pub leader_port: u32,
    pub election_port: u32,
    pub client_port: u32,
}

/// Derived topology addressing shared by all component scripts.
#[derive(Debug, Clone)]
pub struct TopologyFlags {
    pub instances: Vec<LockserverInstance>,
    /// `<n>@<host>:<leader>:<election>:<client>` per instance, joined by commas.
    pub quorum_config: String,
    /// `<host>:<client_port>` per instance, joined by commas.
    pub server_addresses: String,
    /// Flag string passed to every cluster binary.
    pub flags: String,
}

impl TopologyFlags {
    /// Lays lockserver instances over the configured hosts round-robin and
    /// derives the quorum config and flag strings.
    ///
    /// When several instances land on one host, their ports are offset by
    /// the number of instances already on that host.
    pub fn new(hosts: &[HostName], num_instances: usize, ports: &PortsSettings) -> Result<Self> {
        if hosts.is_empty() || num_instances == 0 {
            return Err(PlanError::invalid_argument(
                "lockserver needs at least one host and one instance",
            ));
        }
        let mut instances = Vec::with_capacity(num_instances);
        for i in 0..num_instances {
            let host = hosts[i % hosts.len()].clone();
            let prior = instances.iter().filter(|inst: &&LockserverInstance| inst.host == host).count() as u32;
            instances.push(LockserverInstance {
                host,
                leader_port: ports.lockserver_leader + prior,
                election_port: ports.lockserver_election + prior,
                client_port: ports.lockserver_client + prior,
            });
        }

        let quorum_config = instances
            .iter()
            .enumerate()
            .map(|(i, inst)| {
                format!(
                    "{}@{}:{}:{}:{}",
                    i + 1,
                    inst.host,
                    inst.leader_port,
                    inst.election_port,
                    inst.client_port
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        let server_addresses = instances
            .iter()
            .map(|inst| format!("{}:{}", inst.host, inst.client_port))
            .collect::<Vec<_>>()
            .join(",");

        let flags = format!(
            "-topo_implementation zk2 -topo_global_server_address {} -topo_global_root /cluster/global",
            server_addresses
        );

        Ok(Self {
            instances,
            quorum_config,
            server_addresses,
            flags,
        })
    }

    /// Topology path for a cell: `/cluster/<cell>`.
    pub fn cell_root(cell: &CellName) -> String {
        format!("/cluster/{}", cell)
    }
}
