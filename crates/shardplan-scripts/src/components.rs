//! Per-component script builders.
//!
//! Each builder returns the rendered [`ScriptFile`]s for one component:
//! an aggregate up/down pair in `bin/` plus per-instance scripts in the
//! owning host's subdirectory. Aggregate scripts dispatch instances
//! through `run-script-on-host.sh`.
//!
//! Builders read the committed plan; they never re-derive ids or ports.

use std::path::{Path, PathBuf};

use shardplan_commons::{HostName, Result};
use shardplan_configs::WizardConfig;
use shardplan_planner::{ClusterPlan, ShardId, TabletRecord};

use crate::emitter::ScriptFile;
use crate::topology::TopologyFlags;

/// Name of the shared dispatch helper.
pub const RUN_HELPER: &str = "run-script-on-host.sh";

/// Renders scripts for every cluster component from one plan.
#[derive(Debug)]
pub struct ScriptSet {
    config: WizardConfig,
    topo: TopologyFlags,
    bin_dir: PathBuf,
}

impl ScriptSet {
    /// Builds a script set; fails when no lockserver hosts are configured
    /// (every component script embeds the topology flags).
    pub fn new(config: &WizardConfig) -> Result<Self> {
        let ls_hosts = config.lockserver_hosts();
        // A quorum needs at least 3 instances; spread over the configured
        // hosts round-robin.
        let num_instances = ls_hosts.len().max(3);
        let topo = TopologyFlags::new(&ls_hosts, num_instances, &config.ports)?;
        let bin_dir = Path::new(&config.deployment.deployment_dir).join("bin");
        Ok(Self {
            config: config.clone(),
            topo,
            bin_dir,
        })
    }

    pub fn topology(&self) -> &TopologyFlags {
        &self.topo
    }

    /// Every script for the full deployment, helper first.
    pub fn all(&self, plan: &ClusterPlan) -> Vec<ScriptFile> {
        let mut scripts = vec![self.run_helper()];
        scripts.extend(self.lockserver());
        scripts.extend(self.admind());
        scripts.extend(self.gateway());
        scripts.extend(self.tablet(plan));
        scripts.extend(self.mysqld(plan));
        scripts
    }

    /// The ssh-or-local dispatch helper invoked by every aggregate script.
    pub fn run_helper(&self) -> ScriptFile {
        ScriptFile::new(
            RUN_HELPER,
            r#"#!/bin/bash
# Runs a generated instance script on its target host.
# Usage: run-script-on-host.sh <host> <script> [args...]

host="$1"
shift
script="$1"
shift

if [ "$host" = "$(hostname -f)" ] || [ "$host" = "localhost" ] || [ "$host" = "127.0.0.1" ]; then
    bash "$script" "$@"
else
    ssh "$host" bash "$script" "$@"
fi
"#,
        )
    }

    // ---- lockserver ----

    pub fn lockserver(&self) -> Vec<ScriptFile> {
        let mut scripts = Vec::new();
        let mut up = vec![self.header(), "echo \"Starting lockserver quorum...\"".to_string()];
        let mut down = vec![self.header(), "echo \"Stopping lockserver quorum...\"".to_string()];

        for (i, inst) in self.topo.instances.iter().enumerate() {
            let id = i + 1;
            for ftype in ["up", "down"] {
                let name = format!("lockserver-{}-instance-{:03}.sh", ftype, id);
                let body = self.lockserver_instance(id, ftype);
                let agg = if ftype == "up" { &mut up } else { &mut down };
                agg.push(String::new());
                agg.push(self.dispatch_line(&inst.host, &name));
                scripts.push(ScriptFile::for_host(inst.host.as_str(), name, body));
            }
        }

        up.push(String::new());
        up.push("# Create the global and cell topology paths.".to_string());
        up.push(format!(
            "topocli -server \"{}\" touch -p /cluster/global",
            self.topo.server_addresses
        ));
        up.push(format!(
            "topocli -server \"{}\" touch -p /cluster/${{CELL}}",
            self.topo.server_addresses
        ));
        up.push(String::new());
        up.push("# Register the cell.".to_string());
        up.push(format!(
            "clusterctl ${{TOPOLOGY_FLAGS}} AddCellInfo -root /cluster/${{CELL}} -server_address {} ${{CELL}}",
            self.topo.server_addresses
        ));
        up.push(String::new());

        scripts.push(ScriptFile::new("lockserver-up.sh", up.join("\n")));
        scripts.push(ScriptFile::new("lockserver-down.sh", down.join("\n")));
        scripts
    }

    fn lockserver_instance(&self, id: usize, ftype: &str) -> String {
        let action = if ftype == "up" { "start" } else { "shutdown" };
        format!(
            r#"#!/bin/bash
# Generated file, edit at your own risk.
set -e

export DATA_ROOT={data_root}
LS_ID={id}
LS_DIR=ls_{id:03}
LS_CONFIG="{quorum}"

lockserverd -log_dir "${{DATA_ROOT}}/tmp" -zk.myid "${{LS_ID}}" -zk.cfg "${{LS_CONFIG}}" {action}
"#,
            data_root = self.config.deployment.data_dir,
            id = id,
            quorum = self.topo.quorum_config,
            action = action,
        )
    }

    // ---- admin daemon ----

    pub fn admind(&self) -> Vec<ScriptFile> {
        self.singleton_component(
            "admind",
            &self.config.admin_hosts(),
            |this, host| {
                format!(
                    r#"{header}
HOSTNAME="{host}"
WEB_PORT={web}
GRPC_PORT={grpc}

admind ${{TOPOLOGY_FLAGS}} \
    -cell "${{CELL}}" \
    -web_dir "${{DATA_ROOT}}/web" \
    -log_dir "${{DATA_ROOT}}/tmp" \
    -port "${{WEB_PORT}}" \
    -grpc_port "${{GRPC_PORT}}" \
    -backup_storage_root "${{BACKUP_DIR}}" \
    > "${{DATA_ROOT}}/tmp/admind.out" 2>&1 &
"#,
                    header = this.header(),
                    host = host,
                    web = this.config.ports.admin_web,
                    grpc = this.config.ports.admin_grpc,
                )
            },
            |_this, _host| "pkill -f admind || true\n".to_string(),
        )
    }

    // ---- gateway ----

    pub fn gateway(&self) -> Vec<ScriptFile> {
        self.singleton_component(
            "gateway",
            &self.config.gateway_hosts(),
            |this, host| {
                format!(
                    r#"{header}
HOSTNAME="{host}"
WEB_PORT={web}
GRPC_PORT={grpc}
MYSQL_SERVER_PORT={mysql}

gatewayd ${{TOPOLOGY_FLAGS}} \
    -cell "${{CELL}}" \
    -log_dir "${{DATA_ROOT}}/tmp" \
    -port "${{WEB_PORT}}" \
    -grpc_port "${{GRPC_PORT}}" \
    -mysql_server_port "${{MYSQL_SERVER_PORT}}" \
    > "${{DATA_ROOT}}/tmp/gatewayd.out" 2>&1 &
"#,
                    header = this.header(),
                    host = host,
                    web = this.config.ports.gateway_web,
                    grpc = this.config.ports.gateway_grpc,
                    mysql = this.config.ports.gateway_mysql_server,
                )
            },
            |_this, _host| "pkill -f gatewayd || true\n".to_string(),
        )
    }

    // ---- tablet servers ----

    pub fn tablet(&self, plan: &ClusterPlan) -> Vec<ScriptFile> {
        self.per_tablet_component(plan, "tablet", |this, tablet| {
            (
                this.tablet_instance_up(tablet),
                format!("{}\npkill -f \"tablet-path {}\" || true\n", this.header(), tablet.alias),
            )
        })
    }

    fn tablet_instance_up(&self, tablet: &TabletRecord) -> String {
        format!(
            r#"{header}
KEYSPACE="{keyspace}"
SHARD="{shard}"
TABLET_TYPE="{init_type}"
ALIAS="{alias}"
UNIQUE_ID={uid}
TABLET_DIR={tablet_dir}
WEB_PORT={web}
GRPC_PORT={grpc}
MYSQL_PORT={mysql_port}
MYSQL_HOST="{mysql_host}"
HOSTNAME="{host}"

mkdir -p "${{DATA_ROOT}}/${{TABLET_DIR}}"

tabletserver ${{TOPOLOGY_FLAGS}} \
    -tablet-path "${{ALIAS}}" \
    -init_keyspace "${{KEYSPACE}}" \
    -init_shard "${{SHARD}}" \
    -init_tablet_type "${{TABLET_TYPE}}" \
    -port "${{WEB_PORT}}" \
    -grpc_port "${{GRPC_PORT}}" \
    -backup_storage_root "${{BACKUP_DIR}}" \
    > "${{DATA_ROOT}}/${{TABLET_DIR}}/tabletserver.out" 2>&1 &
"#,
            header = self.header(),
            keyspace = self.config.topology.keyspace,
            shard = tablet.shard,
            init_type = tablet.init_type(),
            alias = tablet.alias,
            uid = tablet.uid,
            tablet_dir = tablet.alias.tablet_dir(),
            web = tablet.web_port,
            grpc = tablet.grpc_port,
            mysql_port = tablet.mysql_port,
            mysql_host = tablet.mysql_host,
            host = tablet.host,
        )
    }

    // ---- mysqld ----

    pub fn mysqld(&self, plan: &ClusterPlan) -> Vec<ScriptFile> {
        self.per_tablet_component(plan, "mysqld", |this, tablet| {
            let up = format!(
                r#"{header}
TABLET_DIR={tablet_dir}
UNIQUE_ID={uid}
MYSQL_PORT={mysql_port}
MYSQL_ROOT={mysql_root}

mysqlctl -log_dir "${{DATA_ROOT}}/tmp" \
    -tablet_uid "${{UNIQUE_ID}}" \
    -mysql_port "${{MYSQL_PORT}}" \
    init -init_db_sql_file "$1"
"#,
                header = this.header(),
                tablet_dir = tablet.alias.tablet_dir(),
                uid = tablet.uid,
                mysql_port = tablet.mysql_port,
                mysql_root = this.config.deployment.mysql_root,
            );
            let down = format!(
                "{}\nmysqlctl -tablet_uid {} shutdown\n",
                this.header(),
                tablet.uid
            );
            (up, down)
        })
    }

    // ---- shared pieces ----

    /// Common env header embedded at the top of every generated script.
    fn header(&self) -> String {
        format!(
            r#"#!/bin/bash
# Generated file, edit at your own risk.
set -e

export DATA_ROOT={data_root}
mkdir -p "${{DATA_ROOT}}/tmp"
BACKUP_DIR="{backup_dir}"
CELL="{cell}"
TOPOLOGY_FLAGS="{flags}"
"#,
            data_root = self.config.deployment.data_dir,
            backup_dir = self.config.backup_dir(),
            cell = self.config.topology.cell,
            flags = self.topo.flags,
        )
    }

    /// `run-script-on-host.sh <host> <absolute instance path>`.
    fn dispatch_line(&self, host: &HostName, instance_name: &str) -> String {
        format!(
            "{} {} {}",
            self.bin_dir.join(RUN_HELPER).display(),
            host,
            self.bin_dir.join(host.as_str()).join(instance_name).display()
        )
    }

    /// One instance per configured host, plus an aggregate up/down pair.
    fn singleton_component(
        &self,
        name: &str,
        hosts: &[HostName],
        up_body: impl Fn(&Self, &HostName) -> String,
        down_body: impl Fn(&Self, &HostName) -> String,
    ) -> Vec<ScriptFile> {
        let mut scripts = Vec::new();
        let mut up = vec![
            "#!/bin/bash".to_string(),
            String::new(),
            format!("echo \"Starting {}...\"", name),
        ];
        let mut down = vec![
            "#!/bin/bash".to_string(),
            String::new(),
            format!("echo \"Stopping {}...\"", name),
        ];

        for (i, host) in hosts.iter().enumerate() {
            for (ftype, agg, body) in [
                ("up", &mut up, up_body(self, host)),
                ("down", &mut down, down_body(self, host)),
            ] {
                let file = format!("{}-{}-instance-{:03}.sh", name, ftype, i + 1);
                agg.push(String::new());
                agg.push(self.dispatch_line(host, &file));
                scripts.push(ScriptFile::for_host(host.as_str(), file, body));
            }
        }

        up.push(String::new());
        down.push(String::new());
        scripts.push(ScriptFile::new(format!("{}-up.sh", name), up.join("\n")));
        scripts.push(ScriptFile::new(format!("{}-down.sh", name), down.join("\n")));
        scripts
    }

    /// Per-tablet instance scripts, per-shard aggregates, and a
    /// per-keyspace aggregate pair.
    fn per_tablet_component(
        &self,
        plan: &ClusterPlan,
        name: &str,
        bodies: impl Fn(&Self, &TabletRecord) -> (String, String),
    ) -> Vec<ScriptFile> {
        let keyspace = &self.config.topology.keyspace;
        let mut scripts = Vec::new();
        let mut ks_up = vec![
            "#!/bin/bash".to_string(),
            String::new(),
            format!("echo \"Starting {} for all shards of {}\"", name, keyspace),
            String::new(),
        ];
        let mut ks_down = ks_up.clone();
        ks_down[2] = format!("echo \"Stopping {} for all shards of {}\"", name, keyspace);

        for shard in plan.shards() {
            let (up_name, down_name) = (
                self.shard_script_name(name, "up", shard),
                self.shard_script_name(name, "down", shard),
            );
            let mut shard_up = vec![
                "#!/bin/bash".to_string(),
                String::new(),
                format!("echo \"Starting {} for shard {}...\"", name, shard),
            ];
            let mut shard_down = vec![
                "#!/bin/bash".to_string(),
                String::new(),
                format!("echo \"Stopping {} for shard {}...\"", name, shard),
            ];

            for tablet in plan.tablets_for_shard(shard) {
                let (up_body, down_body) = bodies(self, tablet);
                for (ftype, agg, body) in [
                    ("up", &mut shard_up, up_body),
                    ("down", &mut shard_down, down_body),
                ] {
                    let file = format!("{}-{}-instance-{}.sh", name, ftype, tablet.uid);
                    agg.push(String::new());
                    agg.push(self.dispatch_line(&tablet.host, &file));
                    scripts.push(ScriptFile::for_host(tablet.host.as_str(), file, body));
                }
            }

            shard_up.push(String::new());
            shard_down.push(String::new());
            ks_up.push(self.bin_dir.join(&up_name).display().to_string());
            ks_up.push(String::new());
            ks_down.push(self.bin_dir.join(&down_name).display().to_string());
            ks_down.push(String::new());
            scripts.push(ScriptFile::new(up_name, shard_up.join("\n")));
            scripts.push(ScriptFile::new(down_name, shard_down.join("\n")));
        }

        scripts.push(ScriptFile::new(
            format!("{}-{}-up.sh", name, keyspace),
            ks_up.join("\n"),
        ));
        scripts.push(ScriptFile::new(
            format!("{}-{}-down.sh", name, keyspace),
            ks_down.join("\n"),
        ));
        scripts
    }

    fn shard_script_name(&self, name: &str, ftype: &str, shard: &ShardId) -> String {
        format!(
            "{}-{}-{}-shard-{}.sh",
            name, ftype, self.config.topology.keyspace, shard
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    use shardplan_planner::{RoleCounts, TopologyPlanner};

    fn config() -> WizardConfig {
        let mut config = WizardConfig::default();
        config.deployment.deployment_dir = "/deploy".to_string();
        config.hosts.lockserver = vec!["h1".to_string(), "h2".to_string(), "h3".to_string()];
        config.hosts.admin = vec!["h1".to_string()];
        config.hosts.gateway = vec!["h1".to_string()];
        config.hosts.tablet = vec!["h1".to_string(), "h2".to_string(), "h3".to_string()];
        config
    }

    fn plan(config: &WizardConfig) -> ClusterPlan {
        let planner = TopologyPlanner::new(config.planner_config().unwrap()).unwrap();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(2).unwrap();
        let counts: HashMap<_, _> = shards
            .iter()
            .map(|s| (s.clone(), RoleCounts::default()))
            .collect();
        let mut rng = StdRng::seed_from_u64(8);
        planner
            .extend(&mut plan, shards, &counts, &config.tablet_hosts(), &mut rng)
            .unwrap();
        plan
    }

    #[test]
    fn test_missing_lockserver_hosts_rejected() {
        let mut config = config();
        config.hosts.lockserver.clear();
        assert!(ScriptSet::new(&config).is_err());
    }

    #[test]
    fn test_tablet_instance_embeds_plan_values() {
        let config = config();
        let set = ScriptSet::new(&config).unwrap();
        let plan = plan(&config);
        let scripts = set.tablet(&plan);

        let first = plan.tablets().first().unwrap();
        let instance = scripts
            .iter()
            .find(|s| {
                s.rel_path
                    == PathBuf::from(first.host.as_str())
                        .join(format!("tablet-up-instance-{}.sh", first.uid))
            })
            .unwrap();
        assert!(instance.content.contains(&format!("ALIAS=\"{}\"", first.alias)));
        assert!(instance.content.contains(&format!("WEB_PORT={}", first.web_port)));
        assert!(instance.content.contains(&format!("SHARD=\"{}\"", first.shard)));
        // Master slots are provisioned as replicas.
        assert!(!instance.content.contains("TABLET_TYPE=\"master\""));
    }

    #[test]
    fn test_shard_aggregates_and_keyspace_wrapper_exist() {
        let config = config();
        let set = ScriptSet::new(&config).unwrap();
        let plan = plan(&config);
        let scripts = set.tablet(&plan);

        let names: Vec<String> = scripts
            .iter()
            .map(|s| s.rel_path.display().to_string())
            .collect();
        assert!(names.contains(&"tablet-up-messagedb-shard--80.sh".to_string()));
        assert!(names.contains(&"tablet-up-messagedb-shard-80-.sh".to_string()));
        assert!(names.contains(&"tablet-messagedb-up.sh".to_string()));
        assert!(names.contains(&"tablet-messagedb-down.sh".to_string()));
    }

    #[test]
    fn test_all_includes_every_component() {
        let config = config();
        let set = ScriptSet::new(&config).unwrap();
        let plan = plan(&config);
        let scripts = set.all(&plan);

        let names: Vec<String> = scripts
            .iter()
            .map(|s| s.rel_path.display().to_string())
            .collect();
        assert!(names.contains(&RUN_HELPER.to_string()));
        assert!(names.contains(&"lockserver-up.sh".to_string()));
        assert!(names.contains(&"admind-up.sh".to_string()));
        assert!(names.contains(&"gateway-down.sh".to_string()));
        // One up + one down instance script per tablet and per mysqld.
        let tablet_instances = names
            .iter()
            .filter(|n| n.contains("tablet-up-instance-"))
            .count();
        assert_eq!(tablet_instances, plan.tablets().len());
    }

    #[test]
    fn test_singleton_instances_numbered_from_one() {
        let config = config();
        let set = ScriptSet::new(&config).unwrap();
        let names: Vec<String> = set
            .admind()
            .iter()
            .map(|s| s.rel_path.display().to_string())
            .collect();
        assert!(names.contains(&"h1/admind-up-instance-001.sh".to_string()));
        assert!(names.contains(&"h1/admind-down-instance-001.sh".to_string()));
        assert!(!names.iter().any(|n| n.contains("instance-0.sh")));
    }

    #[test]
    fn test_mysqld_down_uses_tablet_uid() {
        let config = config();
        let set = ScriptSet::new(&config).unwrap();
        let plan = plan(&config);
        let scripts = set.mysqld(&plan);
        let first = plan.tablets().first().unwrap();
        let down = scripts
            .iter()
            .find(|s| {
                s.rel_path
                    == PathBuf::from(first.host.as_str())
                        .join(format!("mysqld-down-instance-{}.sh", first.uid))
            })
            .unwrap();
        assert!(down
            .content
            .contains(&format!("mysqlctl -tablet_uid {} shutdown", first.uid)));
    }
}
