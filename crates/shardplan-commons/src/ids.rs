//! Identifier newtypes for cluster deployments.
//!
//! Cells, keyspaces and hostnames are supplied by the operator; the tablet
//! alias is derived by the planner and is the globally addressable tablet
//! name consumed by external tooling. Its format must never change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, Result};

/// Named grouping of infrastructure (datacenter / zone).
///
/// The alias format is `<cell>-<uid>`, so a cell name must not contain `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellName(String);

impl CellName {
    /// Validates and wraps a cell name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PlanError::invalid_argument("cell name cannot be empty"));
        }
        if name.contains('-') {
            return Err(PlanError::invalid_argument(format!(
                "cell name must not contain '-': {}",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The logical database whose rows are partitioned into shards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyspaceName(String);

impl KeyspaceName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PlanError::invalid_argument("keyspace name cannot be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A physical host in the deployment pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostName(String);

impl HostName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HostName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HostName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Globally addressable tablet name: `<cell>-<uid padded to 10 digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabletAlias {
    cell: CellName,
    uid: u64,
}

impl TabletAlias {
    pub fn new(cell: CellName, uid: u64) -> Self {
        Self { cell, uid }
    }

    pub fn cell(&self) -> &CellName {
        &self.cell
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Directory name for the tablet's data: `vt_<uid padded to 10 digits>`.
    pub fn tablet_dir(&self) -> String {
        format!("vt_{:010}", self.uid)
    }
}

impl fmt::Display for TabletAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:010}", self.cell, self.uid)
    }
}
