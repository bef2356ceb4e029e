//! JSON persistence of the committed cluster plan.
//!
//! The plan lives at `<deployment_dir>/config/plan.json`. The planner
//! never touches this file; the wizard loads the prior plan before an
//! incremental run and saves the extended plan after a successful commit.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use shardplan_commons::{PlanError, Result};
use shardplan_planner::ClusterPlan;

/// Reads and writes the persisted cluster plan.
#[derive(Debug, Clone)]
pub struct PlanStore {
    path: PathBuf,
}

impl PlanStore {
    /// Store rooted at a deployment directory.
    pub fn new<P: AsRef<Path>>(deployment_dir: P) -> Self {
        Self {
            path: deployment_dir.as_ref().join("config").join("plan.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the persisted plan, or an empty plan when none exists yet.
    pub fn load(&self) -> Result<ClusterPlan> {
        if !self.path.exists() {
            return Ok(ClusterPlan::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let plan = serde_json::from_str(&content)
            .map_err(|e| PlanError::Serialization(format!("{}: {}", self.path.display(), e)))?;
        info!(path = %self.path.display(), "loaded existing plan");
        Ok(plan)
    }

    /// Persists the plan as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, plan: &ClusterPlan) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(plan)
            .map_err(|e| PlanError::Serialization(e.to_string()))?;
        fs::write(&self.path, json)?;
        info!(path = %self.path.display(), shards = plan.shards().len(), "saved plan");
        Ok(())
    }
}
