//! Shell-script generation for planned cluster deployments.
//!
//! Consumes the committed [`ClusterPlan`](shardplan_planner::ClusterPlan)
//! and the wizard configuration and renders start/stop scripts for every
//! cluster component: lockserver, admin daemon, gateway, tablet servers
//! and their mysqld instances. Scripts land under
//! `<deployment_dir>/bin[/<host>]`; aggregate scripts dispatch per-host
//! instance scripts through a shared `run-script-on-host.sh` helper.
//!
//! This crate is string formatting and file I/O only; it never inspects
//! or re-derives planner output.

pub mod components;
pub mod emitter;
pub mod topology;

pub use components::ScriptSet;
pub use emitter::{ScriptEmitter, ScriptFile};
pub use topology::TopologyFlags;
