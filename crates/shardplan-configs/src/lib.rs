//! shardplan-configs
//!
//! Wizard configuration types and loader, plus JSON persistence of the
//! committed cluster plan. The planner itself never reads or writes these
//! files; this crate is the persistence collaborator.

pub mod plan_store;
pub mod types;

mod loader;

pub use plan_store::PlanStore;
pub use types::{
    DeploymentSettings, HostsSettings, PortsSettings, TopologySettings, WizardConfig,
};
