//! End-to-end properties of the topology planner public API.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use shardplan_commons::{CellName, HostName, KeyspaceName, TabletRole};
use shardplan_planner::{ClusterPlan, KeySpace, PlannerConfig, RoleCounts, ShardId, TopologyPlanner};

fn planner() -> TopologyPlanner {
    let config = PlannerConfig::new(
        CellName::new("zone1").unwrap(),
        KeyspaceName::new("orders").unwrap(),
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
fn partition_covers_key_space_for_many_shard_counts() {
    let ks = KeySpace::default();
    for n in 1..=64usize {
        let shards = ks.partition(n).unwrap();
        let mut cursor = 0u128;
        for shard in &shards {
            let range = ks.parse_shard(shard).unwrap();
            assert_eq!(range.start, cursor);
            cursor = range.end;
        }
        assert_eq!(cursor, ks.max());
    }
}

#[test]
fn canonical_shard_names_match_contract() {
    let ks = KeySpace::default();
    assert_eq!(ks.partition(1).unwrap(), vec![ShardId::from("0")]);
    assert_eq!(
        ks.partition(2).unwrap(),
        vec![ShardId::from("-80"), ShardId::from("80-")]
    );
    assert_eq!(
        ks.partition(4).unwrap(),
        vec![
            ShardId::from("-40"),
            ShardId::from("40-80"),
            ShardId::from("80-c0"),
            ShardId::from("c0-"),
        ]
    );
}

#[test]
fn ample_pool_spreads_at_most_one_tablet_per_host() {
    // With len(hosts) >= total tablets, breadth-first spread is exhausted
    // before any host receives a second instance.
    let planner = planner();
    let shards = planner.partition(2).unwrap();
    let counts = uniform_counts(
        &shards,
        RoleCounts {
            master: 1,
            replica: 2,
            rdonly: 2,
        },
    );
    let hosts = pool(&[
        "h01", "h02", "h03", "h04", "h05", "h06", "h07", "h08", "h09", "h10",
    ]);
    for seed in 0..32 {
        let mut plan = ClusterPlan::new();
        let mut rng = StdRng::seed_from_u64(seed);
        planner
            .extend(&mut plan, shards.clone(), &counts, &hosts, &mut rng)
            .unwrap();
        let mut per_host: HashMap<&HostName, usize> = HashMap::new();
        for t in plan.tablets() {
            *per_host.entry(&t.host).or_default() += 1;
        }
        assert!(per_host.values().all(|&c| c == 1));
        assert_eq!(per_host.len(), 10);
    }
}

#[test]
fn three_hosts_one_shard_three_tablets_spread_evenly() {
    let planner = planner();
    let shards = planner.partition(1).unwrap();
    let counts = uniform_counts(
        &shards,
        RoleCounts {
            master: 1,
            replica: 2,
            rdonly: 0,
        },
    );
    for seed in 0..32 {
        let mut plan = ClusterPlan::new();
        let mut rng = StdRng::seed_from_u64(seed);
        planner
            .extend(
                &mut plan,
                shards.clone(),
                &counts,
                &pool(&["h1", "h2", "h3"]),
                &mut rng,
            )
            .unwrap();
        let mut per_host: Vec<usize> = Vec::new();
        for host in ["h1", "h2", "h3"] {
            let host = HostName::from(host);
            per_host.push(plan.tablets_for_host(&host).count());
        }
        per_host.sort_unstable();
        assert_eq!(per_host, vec![1, 1, 1]);
    }
}

#[test]
fn no_identifier_collisions_across_full_output() {
    let planner = planner();
    let mut plan = ClusterPlan::new();
    let shards = planner.partition(8).unwrap();
    let counts = uniform_counts(&shards, RoleCounts::default());
    let mut rng = StdRng::seed_from_u64(4);
    planner
        .extend(&mut plan, shards, &counts, &pool(&["h1", "h2", "h3", "h4"]), &mut rng)
        .unwrap();

    let mut uids = HashSet::new();
    let mut aliases = HashSet::new();
    let mut ports = HashSet::new();
    for t in plan.tablets() {
        assert!(uids.insert(t.uid), "uid {} repeated", t.uid);
        assert!(aliases.insert(t.alias.to_string()));
        for port in [t.web_port, t.grpc_port, t.mysql_port] {
            assert!(ports.insert(port), "port {} repeated", port);
        }
    }
    assert_eq!(plan.tablets().len(), 8 * 5);
}

#[test]
fn extending_a_plan_reproduces_the_prefix_identically() {
    let planner = planner();
    let hosts = pool(&["h1", "h2", "h3", "h4"]);

    let mut plan = ClusterPlan::new();
    let first = planner.partition(2).unwrap();
    let counts = uniform_counts(&first, RoleCounts::default());
    let mut rng = StdRng::seed_from_u64(77);
    planner
        .extend(&mut plan, first.clone(), &counts, &hosts, &mut rng)
        .unwrap();

    let prefix = plan.tablets().to_vec();
    let prefix_shards = plan.shards().to_vec();

    let added = vec![ShardId::from("20-60")];
    let counts = uniform_counts(&added, RoleCounts::default());
    planner
        .extend(&mut plan, added.clone(), &counts, &hosts, &mut rng)
        .unwrap();

    assert_eq!(&plan.shards()[..2], &prefix_shards[..]);
    assert_eq!(plan.shards()[2], added[0]);
    assert_eq!(&plan.tablets()[..prefix.len()], &prefix[..]);
    // New tablets continue after the prefix with the next shard's id block.
    for t in &plan.tablets()[prefix.len()..] {
        assert_eq!(t.shard, added[0]);
        assert!(t.uid > prefix.last().unwrap().uid);
    }
}

#[test]
fn master_slots_are_provisioned_as_replicas() {
    let planner = planner();
    let mut plan = ClusterPlan::new();
    let shards = planner.partition(2).unwrap();
    let counts = uniform_counts(&shards, RoleCounts::default());
    let mut rng = StdRng::seed_from_u64(6);
    planner
        .extend(&mut plan, shards, &counts, &pool(&["h1", "h2"]), &mut rng)
        .unwrap();

    for t in plan.tablets() {
        assert_ne!(t.init_type(), TabletRole::Master);
        if t.role == TabletRole::Master {
            assert_eq!(t.init_type(), TabletRole::Replica);
        }
    }
}
