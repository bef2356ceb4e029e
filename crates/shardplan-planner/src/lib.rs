//! Cluster topology planner.
//!
//! This crate is the one part of shardplan with real algorithmic content.
//! It partitions a keyspace's row-key space into contiguous shard ranges,
//! assigns per-shard, per-role tablet instances to a pool of physical hosts
//! under load-balancing and role-diversity constraints, and derives globally
//! unique numeric identifiers and network ports for every planned tablet.
//!
//! Data flows one way:
//!
//! ```text
//! KeySpace::partition -> shard list -> TopologyPlanner::propose
//!     -> TabletRecord batch -> (optional operator overrides)
//!     -> TopologyPlanner::commit -> ClusterPlan
//! ```
//!
//! The planner is synchronous pure computation: it performs no I/O, talks
//! to no cluster runtime, and either completes a run or fails fast with
//! `PlanError::InvalidArgument`. Persistence of the resulting plan belongs
//! to `shardplan-configs`; script emission to `shardplan-scripts`.

pub mod keyrange;
pub mod placement;
pub mod plan;

pub use keyrange::{KeyRange, KeySpace, ShardId};
pub use placement::{HostLoadState, Placement, TabletSlot};
pub use plan::{ClusterPlan, PlannerConfig, RoleCounts, TabletRecord, TopologyPlanner};
