//! Logging setup powered by tracing-subscriber.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. `RUST_LOG` wins over the
/// verbosity flag when set.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
