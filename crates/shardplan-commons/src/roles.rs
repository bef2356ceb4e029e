//! Tablet role definitions.
//!
//! Every shard has exactly one logical master slot. The slot is provisioned
//! as a `replica` instance at creation time and promoted externally later,
//! so anything that renders a tablet's init type must go through
//! [`TabletRole::init_type`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The functional type of a tablet instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabletRole {
    /// The logical master slot (provisioned as replica, promoted externally)
    Master,
    /// Read-write replica participating in semi-sync replication
    Replica,
    /// Read-only tablet used for batch jobs and resharding
    Rdonly,
}

impl TabletRole {
    /// Placement priority order: master first so the most failure-critical
    /// role gets the most even spread.
    pub const PLACEMENT_ORDER: [TabletRole; 3] =
        [TabletRole::Master, TabletRole::Replica, TabletRole::Rdonly];

    /// The tablet type a freshly provisioned instance starts with.
    ///
    /// Master slots start life as replicas; the planner never emits a
    /// tablet pre-tagged `master`.
    pub fn init_type(&self) -> TabletRole {
        match self {
            TabletRole::Master => TabletRole::Replica,
            other => *other,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TabletRole::Master => "master",
            TabletRole::Replica => "replica",
            TabletRole::Rdonly => "rdonly",
        }
    }
}

impl fmt::Display for TabletRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TabletRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(TabletRole::Master),
            "replica" => Ok(TabletRole::Replica),
            "rdonly" => Ok(TabletRole::Rdonly),
            other => Err(format!("Unknown tablet role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(TabletRole::Master.to_string(), "master");
        assert_eq!(TabletRole::Replica.to_string(), "replica");
        assert_eq!(TabletRole::Rdonly.to_string(), "rdonly");
    }

    #[test]
    fn test_role_roundtrip() {
        for role in TabletRole::PLACEMENT_ORDER {
            assert_eq!(role.as_str().parse::<TabletRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_master_init_type_is_replica() {
        assert_eq!(TabletRole::Master.init_type(), TabletRole::Replica);
        assert_eq!(TabletRole::Replica.init_type(), TabletRole::Replica);
        assert_eq!(TabletRole::Rdonly.init_type(), TabletRole::Rdonly);
    }

    #[test]
    fn test_placement_order() {
        assert_eq!(
            TabletRole::PLACEMENT_ORDER,
            [TabletRole::Master, TabletRole::Replica, TabletRole::Rdonly]
        );
    }
}
