//! Error types shared across the shardplan crates.

use thiserror::Error;

/// Result type for planning operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors that can occur while planning a deployment or emitting scripts.
///
/// The planner itself performs no I/O, so its failures are always
/// `InvalidArgument`: they are surfaced immediately to the caller and are
/// never retried. The remaining variants belong to the collaborator crates
/// (config persistence, script emission).
#[derive(Debug, Error)]
pub enum PlanError {
    /// Bad input supplied to the planner (shard count, host pool, cell name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file or value error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Script rendering failed (unknown variable, bad template)
    #[error("Script rendering error: {0}")]
    Render(String),

    /// Filesystem error while persisting a plan or writing scripts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plan (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PlanError {
    /// Creates an InvalidArgument error with a message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a Configuration error with a message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
