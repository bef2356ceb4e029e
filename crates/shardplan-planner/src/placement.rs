//! Tablet-to-host placement.
//!
//! Distributes tablets for a batch of shards evenly over the configured
//! host pool while maintaining tablet role diversity. Roles are processed
//! master first (the most failure-critical role gets the most even spread),
//! then shards in shard-list order, then instances in index order.
//!
//! Host choice per tablet:
//! - while any host is still idle in this run, pick uniformly at random
//!   among the idle hosts, so breadth-first spread is exhausted before any
//!   host receives a second instance;
//! - otherwise pick the host minimizing
//!   `total + same_shard + (1 if the host already holds this shard's
//!   master)`, ties broken by host pool input order.
//!
//! The scoring formula is a contract inherited from the tooling this
//! planner feeds; it is reproduced, not re-derived.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use tracing::debug;

use shardplan_commons::{HostName, PlanError, Result, TabletRole};

use crate::keyrange::ShardId;
use crate::plan::RoleCounts;

/// One tablet to place: a (shard, role, instance) tuple.
///
/// `instance` is 1-based within its (shard, role) group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabletSlot {
    pub shard: ShardId,
    pub role: TabletRole,
    pub instance: u32,
}

/// Per-host load accumulated during a single placement run.
///
/// Owned exclusively by the placement routine; never shared across runs.
#[derive(Debug, Default)]
pub struct HostLoadState {
    loads: HashMap<HostName, Vec<TabletSlot>>,
}

impl HostLoadState {
    fn is_idle(&self, host: &HostName) -> bool {
        !self.loads.contains_key(host)
    }

    fn assign(&mut self, host: &HostName, slot: TabletSlot) {
        self.loads.entry(host.clone()).or_default().push(slot);
    }

    /// Load score for placing a tablet of `shard` on `host`.
    fn score(&self, host: &HostName, shard: &ShardId) -> usize {
        let Some(slots) = self.loads.get(host) else {
            return 0;
        };
        let same_shard = slots.iter().filter(|s| &s.shard == shard).count();
        let shard_master = slots
            .iter()
            .any(|s| &s.shard == shard && s.role == TabletRole::Master);
        slots.len() + same_shard + usize::from(shard_master)
    }
}

/// Result of one placement run.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    /// Host -> tablets assigned to it, in assignment order.
    pub by_host: BTreeMap<HostName, Vec<TabletSlot>>,
    /// (shard, role, instance) -> host.
    pub by_slot: HashMap<TabletSlot, HostName>,
}

/// Places every requested (shard, role, instance) tuple onto a host.
///
/// `hosts` must be deduplicated and order-preserving; its order is the
/// tie-break for equal load scores. Fails with `InvalidArgument` when the
/// pool is empty but role counts are non-zero.
pub fn place<R: Rng + ?Sized>(
    shards: &[ShardId],
    role_counts: &HashMap<ShardId, RoleCounts>,
    hosts: &[HostName],
    rng: &mut R,
) -> Result<Placement> {
    let total: u64 = shards
        .iter()
        .map(|s| role_counts.get(s).map_or(0, |c| c.total() as u64))
        .sum();
    if total == 0 {
        return Ok(Placement::default());
    }
    if hosts.is_empty() {
        return Err(PlanError::invalid_argument(
            "cannot place tablets: host pool is empty",
        ));
    }

    let mut state = HostLoadState::default();
    let mut placement = Placement::default();

    for role in TabletRole::PLACEMENT_ORDER {
        for shard in shards {
            let count = role_counts.get(shard).map_or(0, |c| c.count(role));
            for instance in 1..=count {
                let slot = TabletSlot {
                    shard: shard.clone(),
                    role,
                    instance,
                };
                let host = choose_host(&state, hosts, shard, rng);
                debug!(
                    shard = %slot.shard,
                    role = %slot.role,
                    instance = slot.instance,
                    host = %host,
                    "placed tablet"
                );
                state.assign(&host, slot.clone());
                placement
                    .by_host
                    .entry(host.clone())
                    .or_default()
                    .push(slot.clone());
                placement.by_slot.insert(slot, host);
            }
        }
    }

    Ok(placement)
}

fn choose_host<R: Rng + ?Sized>(
    state: &HostLoadState,
    hosts: &[HostName],
    shard: &ShardId,
    rng: &mut R,
) -> HostName {
    let idle: Vec<&HostName> = hosts.iter().filter(|h| state.is_idle(h)).collect();
    if !idle.is_empty() {
        return idle[rng.random_range(0..idle.len())].clone();
    }
    // min_by_key keeps the first minimum, so ties fall to pool input order.
    hosts
        .iter()
        .min_by_key(|h| state.score(h, shard))
        .expect("host pool checked non-empty")
        .clone()
}
