//! Tablet records, planner configuration and the incremental cluster plan.
//!
//! Identifier and port derivation runs after host assignment, iterating
//! shards in full shard-list order, roles master -> replica -> rdonly,
//! then instances. For the tablet at position `cnt` (1-based, reset per
//! shard) of the shard at index `i` (0-based) in the full shard list:
//!
//! ```text
//! base_offset = offset_base * (i + 1)
//! unique_id   = base_offset + cnt
//! web_port    = base_web_port   + base_offset + cnt
//! grpc_port   = base_grpc_port  + base_offset + cnt
//! mysql_port  = base_mysql_port + base_offset + cnt
//! ```
//!
//! Derived values are defaults offered to the operator; once a caller
//! overrides one, [`TopologyPlanner::commit`] never recomputes it.
//!
//! Incremental runs append: a plan extended with new shards reproduces
//! every previously committed record byte-for-byte because committed
//! records are never touched and `base_offset` depends only on a shard's
//! index in the append-only shard list.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shardplan_commons::{CellName, HostName, KeyspaceName, PlanError, Result, TabletAlias, TabletRole};

use crate::keyrange::{KeySpace, ShardId};
use crate::placement::{self, TabletSlot};

/// Default spacing between consecutive shards' id blocks.
pub const DEFAULT_OFFSET_BASE: u64 = 100;

/// Default base ports for tablet processes.
pub const DEFAULT_BASE_WEB_PORT: u32 = 15100;
pub const DEFAULT_BASE_GRPC_PORT: u32 = 16100;
pub const DEFAULT_BASE_MYSQL_PORT: u32 = 17100;

/// Standard mysql port, the default when a tablet's mysqld lives on a
/// different host than the tablet itself.
pub const EXTERNAL_MYSQL_PORT: u32 = 3306;

/// Requested tablet counts per role for one shard.
///
/// `master` is the number of logical master slots and must be exactly 1:
/// the slot is provisioned as a replica and promoted externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub master: u32,
    pub replica: u32,
    pub rdonly: u32,
}

impl RoleCounts {
    pub fn count(&self, role: TabletRole) -> u32 {
        match role {
            TabletRole::Master => self.master,
            TabletRole::Replica => self.replica,
            TabletRole::Rdonly => self.rdonly,
        }
    }

    pub fn total(&self) -> u32 {
        self.master + self.replica + self.rdonly
    }

    pub fn validate(&self) -> Result<()> {
        if self.master != 1 {
            return Err(PlanError::invalid_argument(format!(
                "every shard needs exactly one master slot, got {}",
                self.master
            )));
        }
        Ok(())
    }
}

impl Default for RoleCounts {
    /// The recommended layout: 1 master slot, 2 extra replicas for
    /// semi-sync failover, 2 rdonly for resharding workflows.
    fn default() -> Self {
        Self {
            master: 1,
            replica: 2,
            rdonly: 2,
        }
    }
}

/// One planned server instance. Immutable once committed to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabletRecord {
    pub shard: ShardId,
    pub role: TabletRole,
    /// 1-based index within the (shard, role) group.
    pub instance: u32,
    pub host: HostName,
    pub uid: u64,
    pub alias: TabletAlias,
    pub web_port: u32,
    pub grpc_port: u32,
    pub mysql_port: u32,
    /// Host running this tablet's mysqld; defaults to `host`.
    pub mysql_host: HostName,
}

impl TabletRecord {
    /// The tablet type this instance is provisioned with. Master slots
    /// start as replicas.
    pub fn init_type(&self) -> TabletRole {
        self.role.init_type()
    }

    pub fn slot(&self) -> TabletSlot {
        TabletSlot {
            shard: self.shard.clone(),
            role: self.role,
            instance: self.instance,
        }
    }

    /// Default mysql port to offer when editing this record: the derived
    /// port for a co-located mysqld, [`EXTERNAL_MYSQL_PORT`] when the
    /// mysqld lives on a different host.
    pub fn default_mysql_port(&self) -> u32 {
        if self.mysql_host == self.host {
            self.mysql_port
        } else {
            EXTERNAL_MYSQL_PORT
        }
    }
}

/// Planner configuration, threaded explicitly through every call.
///
/// There is deliberately no process-wide configuration: two planners with
/// different cells or port bases can coexist in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub cell: CellName,
    pub keyspace: KeyspaceName,
    pub key_space: KeySpace,
    /// Spacing between consecutive shards' id blocks.
    pub offset_base: u64,
    /// Starting value of the per-shard tablet counter.
    pub id_offset: u64,
    pub base_web_port: u32,
    pub base_grpc_port: u32,
    pub base_mysql_port: u32,
}

impl PlannerConfig {
    pub fn new(cell: CellName, keyspace: KeyspaceName) -> Self {
        Self {
            cell,
            keyspace,
            key_space: KeySpace::default(),
            offset_base: DEFAULT_OFFSET_BASE,
            id_offset: 0,
            base_web_port: DEFAULT_BASE_WEB_PORT,
            base_grpc_port: DEFAULT_BASE_GRPC_PORT,
            base_mysql_port: DEFAULT_BASE_MYSQL_PORT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.offset_base == 0 {
            return Err(PlanError::invalid_argument("offset_base must be > 0"));
        }
        Ok(())
    }
}

/// The incremental planning state: every shard and tablet committed so
/// far, in commit order.
///
/// Records are append-only; an extension run never mutates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterPlan {
    shards: Vec<ShardId>,
    tablets: Vec<TabletRecord>,
}

impl ClusterPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shards(&self) -> &[ShardId] {
        &self.shards
    }

    pub fn tablets(&self) -> &[TabletRecord] {
        &self.tablets
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn tablets_for_shard<'a>(
        &'a self,
        shard: &'a ShardId,
    ) -> impl Iterator<Item = &'a TabletRecord> {
        self.tablets.iter().filter(move |t| &t.shard == shard)
    }

    pub fn tablets_for_host<'a>(
        &'a self,
        host: &'a HostName,
    ) -> impl Iterator<Item = &'a TabletRecord> {
        self.tablets.iter().filter(move |t| &t.host == host)
    }

    /// Hosts referenced by the plan, deduplicated, in first-use order.
    pub fn hosts(&self) -> Vec<HostName> {
        let mut seen = HashSet::new();
        let mut hosts = Vec::new();
        for tablet in &self.tablets {
            if seen.insert(tablet.host.clone()) {
                hosts.push(tablet.host.clone());
            }
        }
        hosts
    }
}

/// The topology planner: partitions key ranges, places tablets and
/// derives their identifiers and ports.
#[derive(Debug, Clone)]
pub struct TopologyPlanner {
    config: PlannerConfig,
}

impl TopologyPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Canonical shard names for an initial partition of the key space.
    pub fn partition(&self, num_shards: usize) -> Result<Vec<ShardId>> {
        self.config.key_space.partition(num_shards)
    }

    /// Computes default tablet records for `new_shards` against `plan`.
    ///
    /// The records are not yet part of the plan; the caller may override
    /// hosts and ports on them before [`commit`](Self::commit). Previously
    /// committed records are replayed from `plan`, never re-placed, so
    /// extension runs leave the existing prefix untouched.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        plan: &ClusterPlan,
        new_shards: &[ShardId],
        role_counts: &HashMap<ShardId, RoleCounts>,
        hosts: &[HostName],
        rng: &mut R,
    ) -> Result<Vec<TabletRecord>> {
        self.check_new_shards(plan, new_shards)?;
        for shard in new_shards {
            let counts = role_counts.get(shard).ok_or_else(|| {
                PlanError::invalid_argument(format!("no role counts for shard {}", shard))
            })?;
            counts.validate()?;
        }

        let pool = dedup_hosts(hosts);
        let placement = placement::place(new_shards, role_counts, &pool, rng)?;

        let mut records = Vec::new();
        for (offset, shard) in new_shards.iter().enumerate() {
            let shard_index = plan.shards.len() + offset;
            let base_offset = self
                .config
                .offset_base
                .checked_mul(shard_index as u64 + 1)
                .ok_or_else(|| {
                    PlanError::invalid_argument(format!(
                        "offset_base {} overflows at shard index {}",
                        self.config.offset_base, shard_index
                    ))
                })?;
            let counts = &role_counts[shard];
            let mut cnt = self.config.id_offset;
            for role in TabletRole::PLACEMENT_ORDER {
                for instance in 1..=counts.count(role) {
                    cnt += 1;
                    let uid = base_offset + cnt;
                    let slot = TabletSlot {
                        shard: shard.clone(),
                        role,
                        instance,
                    };
                    let host = placement.by_slot[&slot].clone();
                    debug!(shard = %shard, uid, %host, "derived tablet defaults");
                    records.push(TabletRecord {
                        shard: shard.clone(),
                        role,
                        instance,
                        mysql_host: host.clone(),
                        host,
                        uid,
                        alias: TabletAlias::new(self.config.cell.clone(), uid),
                        web_port: derive_port(self.config.base_web_port, uid)?,
                        grpc_port: derive_port(self.config.base_grpc_port, uid)?,
                        mysql_port: derive_port(self.config.base_mysql_port, uid)?,
                    });
                }
            }
        }
        Ok(records)
    }

    /// Appends a proposed (and possibly operator-adjusted) batch to the
    /// plan after uniqueness validation. Overridden values are taken as
    /// supplied, never recomputed.
    pub fn commit(
        &self,
        plan: &mut ClusterPlan,
        new_shards: Vec<ShardId>,
        records: Vec<TabletRecord>,
    ) -> Result<()> {
        self.check_new_shards(plan, &new_shards)?;
        for record in &records {
            if !new_shards.contains(&record.shard) {
                return Err(PlanError::invalid_argument(format!(
                    "tablet {} belongs to shard {} which is not part of this batch",
                    record.alias, record.shard
                )));
            }
        }

        let mut uids: HashSet<u64> = plan.tablets.iter().map(|t| t.uid).collect();
        for record in &records {
            if !uids.insert(record.uid) {
                return Err(PlanError::invalid_argument(format!(
                    "duplicate tablet uid {}",
                    record.uid
                )));
            }
        }
        check_port_collisions(plan.tablets.iter().chain(records.iter()))?;

        plan.shards.extend(new_shards);
        plan.tablets.extend(records);
        Ok(())
    }

    /// Convenience wrapper: propose and commit in one step, keeping every
    /// derived default.
    pub fn extend<R: Rng + ?Sized>(
        &self,
        plan: &mut ClusterPlan,
        new_shards: Vec<ShardId>,
        role_counts: &HashMap<ShardId, RoleCounts>,
        hosts: &[HostName],
        rng: &mut R,
    ) -> Result<Vec<TabletRecord>> {
        let records = self.propose(plan, &new_shards, role_counts, hosts, rng)?;
        self.commit(plan, new_shards, records.clone())?;
        Ok(records)
    }

    fn check_new_shards(&self, plan: &ClusterPlan, new_shards: &[ShardId]) -> Result<()> {
        let mut seen: HashSet<&ShardId> = plan.shards.iter().collect();
        for shard in new_shards {
            self.config.key_space.parse_shard(shard)?;
            if !seen.insert(shard) {
                return Err(PlanError::invalid_argument(format!(
                    "duplicate shard {}",
                    shard
                )));
            }
        }
        Ok(())
    }
}

/// `base + uid` as a port number, rejecting ids too large to offset a
/// port instead of wrapping.
fn derive_port(base: u32, uid: u64) -> Result<u32> {
    u32::try_from(uid)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .ok_or_else(|| {
            PlanError::invalid_argument(format!(
                "tablet uid {} is too large to derive a port from base {}",
                uid, base
            ))
        })
}

/// Order-preserving host deduplication.
fn dedup_hosts(hosts: &[HostName]) -> Vec<HostName> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .filter(|h| seen.insert((*h).clone()))
        .cloned()
        .collect()
}

/// A host must not serve two tablet processes on the same port.
fn check_port_collisions<'a>(tablets: impl Iterator<Item = &'a TabletRecord>) -> Result<()> {
    let mut in_use: HashSet<(HostName, u32)> = HashSet::new();
    for tablet in tablets {
        for port in [tablet.web_port, tablet.grpc_port] {
            if !in_use.insert((tablet.host.clone(), port)) {
                return Err(PlanError::invalid_argument(format!(
                    "port {} already in use on host {}",
                    port, tablet.host
                )));
            }
        }
        if !in_use.insert((tablet.mysql_host.clone(), tablet.mysql_port)) {
            return Err(PlanError::invalid_argument(format!(
                "mysql port {} already in use on host {}",
                tablet.mysql_port, tablet.mysql_host
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn planner() -> TopologyPlanner {
        let config = PlannerConfig::new(
            CellName::new("uswest").unwrap(),
            KeyspaceName::new("messagedb").unwrap(),
        );
        TopologyPlanner::new(config).unwrap()
    }

    fn pool(names: &[&str]) -> Vec<HostName> {
        names.iter().map(|n| HostName::from(*n)).collect()
    }

    fn uniform_counts(shards: &[ShardId], counts: RoleCounts) -> HashMap<ShardId, RoleCounts> {
        shards.iter().map(|s| (s.clone(), counts)).collect()
    }

    #[test]
    fn test_uid_and_port_derivation() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(2).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(5);
        let records = planner
            .extend(&mut plan, shards, &counts, &pool(&["h1", "h2", "h3"]), &mut rng)
            .unwrap();

        // Shard 0 block starts at 100, shard 1 block at 200; the counter
        // is 1-based after its first increment.
        assert_eq!(records[0].uid, 101);
        assert_eq!(records[0].role, TabletRole::Master);
        assert_eq!(records[0].web_port, 15201);
        assert_eq!(records[0].grpc_port, 16201);
        assert_eq!(records[0].mysql_port, 17201);
        assert_eq!(records[0].alias.to_string(), "uswest-0000000101");

        assert_eq!(records[4].uid, 105);
        assert_eq!(records[5].uid, 201);
        assert_eq!(records[5].shard.as_str(), "80-");
    }

    #[test]
    fn test_uids_strictly_increase_within_shard() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(4).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(2);
        planner
            .extend(&mut plan, shards.clone(), &counts, &pool(&["h1", "h2"]), &mut rng)
            .unwrap();
        for shard in &shards {
            let uids: Vec<u64> = plan.tablets_for_shard(shard).map(|t| t.uid).collect();
            assert!(uids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_no_uid_alias_or_port_repeats() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(4).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(9);
        planner
            .extend(&mut plan, shards, &counts, &pool(&["h1", "h2", "h3"]), &mut rng)
            .unwrap();

        let mut uids = HashSet::new();
        let mut aliases = HashSet::new();
        let mut ports = HashSet::new();
        for t in plan.tablets() {
            assert!(uids.insert(t.uid));
            assert!(aliases.insert(t.alias.to_string()));
            for port in [t.web_port, t.grpc_port, t.mysql_port] {
                assert!(ports.insert(port), "port {} repeated", port);
            }
        }
    }

    #[test]
    fn test_incremental_extension_is_idempotent_on_prefix() {
        let planner = planner();
        let hosts = pool(&["h1", "h2", "h3"]);

        let mut plan = ClusterPlan::new();
        let first = planner.partition(2).unwrap();
        let counts = uniform_counts(&first, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(21);
        planner
            .extend(&mut plan, first, &counts, &hosts, &mut rng)
            .unwrap();
        let before = plan.tablets().to_vec();

        let new_shard = vec![ShardId::from("40-80")];
        // Overlaps the existing ranges but is a distinct shard name; range
        // overlap handling belongs to resharding workflows, not the planner.
        let counts = uniform_counts(&new_shard, RoleCounts::default());
        planner
            .extend(&mut plan, new_shard, &counts, &hosts, &mut rng)
            .unwrap();

        assert_eq!(&plan.tablets()[..before.len()], &before[..]);
        // The appended shard continues the id blocks after the prefix.
        assert_eq!(plan.tablets()[before.len()].uid, 301);
    }

    #[test]
    fn test_commit_preserves_operator_overrides() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(1).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(3);
        let mut records = planner
            .propose(&plan, &shards, &counts, &pool(&["h1"]), &mut rng)
            .unwrap();

        records[0].web_port = 19999;
        records[0].mysql_host = HostName::from("db-ext.example.com");
        records[0].mysql_port = 3306;
        planner.commit(&mut plan, shards, records).unwrap();

        assert_eq!(plan.tablets()[0].web_port, 19999);
        assert_eq!(plan.tablets()[0].mysql_host.as_str(), "db-ext.example.com");
        assert_eq!(plan.tablets()[0].mysql_port, 3306);
    }

    #[test]
    fn test_external_mysql_host_defaults_port_3306() {
        let planner = planner();
        let plan = ClusterPlan::new();
        let shards = planner.partition(1).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(17);
        let mut records = planner
            .propose(&plan, &shards, &counts, &pool(&["h1"]), &mut rng)
            .unwrap();

        // Co-located mysqld keeps the derived port as its default.
        assert_eq!(records[0].mysql_host, records[0].host);
        assert_eq!(records[0].default_mysql_port(), records[0].mysql_port);

        // A differing mysql host switches the default to the standard port.
        records[0].mysql_host = HostName::from("db-ext.example.com");
        assert_eq!(records[0].default_mysql_port(), EXTERNAL_MYSQL_PORT);
    }

    #[test]
    fn test_duplicate_shard_rejected() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(1).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(1);
        planner
            .extend(&mut plan, shards.clone(), &counts, &pool(&["h1"]), &mut rng)
            .unwrap();
        let err = planner.propose(&plan, &shards, &counts, &pool(&["h1"]), &mut rng);
        assert!(err.is_err());
    }

    #[test]
    fn test_master_count_must_be_one() {
        let planner = planner();
        let plan = ClusterPlan::new();
        let shards = planner.partition(1).unwrap();
        let counts = uniform_counts(
            &shards,
            RoleCounts {
                master: 2,
                replica: 0,
                rdonly: 0,
            },
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert!(planner
            .propose(&plan, &shards, &counts, &pool(&["h1"]), &mut rng)
            .is_err());
    }

    #[test]
    fn test_oversized_id_block_rejected_instead_of_wrapping_ports() {
        let mut config = PlannerConfig::new(
            CellName::new("uswest").unwrap(),
            KeyspaceName::new("messagedb").unwrap(),
        );
        config.offset_base = u64::from(u32::MAX);
        let planner = TopologyPlanner::new(config).unwrap();
        let plan = ClusterPlan::new();
        let shards = planner.partition(1).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(1);
        let err = planner
            .propose(&plan, &shards, &counts, &pool(&["h1"]), &mut rng)
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidArgument(_)));
    }

    #[test]
    fn test_plan_json_roundtrip() {
        let planner = planner();
        let mut plan = ClusterPlan::new();
        let shards = planner.partition(2).unwrap();
        let counts = uniform_counts(&shards, RoleCounts::default());
        let mut rng = StdRng::seed_from_u64(13);
        planner
            .extend(&mut plan, shards, &counts, &pool(&["h1", "h2"]), &mut rng)
            .unwrap();

        let json = serde_json::to_string_pretty(&plan).unwrap();
        let restored: ClusterPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.shards(), plan.shards());
        assert_eq!(restored.tablets(), plan.tablets());
    }
}
