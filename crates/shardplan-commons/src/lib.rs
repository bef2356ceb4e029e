//! Shared types for the shardplan workspace.
//!
//! This crate holds the identifier newtypes, the tablet role enum and the
//! common error type used by the planner, config and script crates. It has
//! no knowledge of planning or script generation itself.

pub mod errors;
pub mod ids;
pub mod roles;

pub use errors::{PlanError, Result};
pub use ids::{CellName, HostName, KeyspaceName, TabletAlias};
pub use roles::TabletRole;
