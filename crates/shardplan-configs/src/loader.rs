//! Configuration loading: TOML file, environment overrides, validation.

use std::env;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::types::WizardConfig;

impl WizardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment overrides are applied separately via
    /// `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: WizardConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Load from a file when it exists, defaults otherwise, then apply
    /// environment overrides and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            info!(path = %path.display(), "loading wizard config");
            Self::from_file(path)?
        } else {
            info!(path = %path.display(), "config file missing, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides.
    ///
    /// `CELL`, `KEYSPACE` and `DEPLOYMENT_DIR` override their config
    /// fields; `TABLET_ID_BASE` and `TABLET_ID_OFFSET` override the id
    /// derivation constants.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(cell) = env::var("CELL") {
            self.topology.cell = cell;
        }
        if let Ok(keyspace) = env::var("KEYSPACE") {
            self.topology.keyspace = keyspace;
        }
        if let Ok(dir) = env::var("DEPLOYMENT_DIR") {
            self.deployment.deployment_dir = dir;
        }
        if let Ok(base) = env::var("TABLET_ID_BASE") {
            if let Ok(base) = base.parse() {
                self.topology.offset_base = base;
            }
        }
        if let Ok(offset) = env::var("TABLET_ID_OFFSET") {
            if let Ok(offset) = offset.parse() {
                self.topology.tablet_id_offset = offset;
            }
        }
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        // Cell/keyspace/offset rules live with the planner config.
        self.planner_config()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        if self.deployment.deployment_dir.is_empty() {
            return Err(anyhow::anyhow!("deployment_dir cannot be empty"));
        }

        for (name, port) in [
            ("ports.gateway_web", self.ports.gateway_web),
            ("ports.gateway_grpc", self.ports.gateway_grpc),
            ("ports.gateway_mysql_server", self.ports.gateway_mysql_server),
            ("ports.admin_web", self.ports.admin_web),
            ("ports.admin_grpc", self.ports.admin_grpc),
            ("ports.lockserver_leader", self.ports.lockserver_leader),
            ("ports.lockserver_election", self.ports.lockserver_election),
            ("ports.lockserver_client", self.ports.lockserver_client),
        ] {
            if port == 0 {
                return Err(anyhow::anyhow!("{} cannot be 0", name));
            }
        }

        Ok(())
    }
}
