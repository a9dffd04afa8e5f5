//! Error types for library executions

use plugfy_channel::{ChannelError, ChannelState};
use plugfy_config::ConfigError;
use plugfy_plugin::PluginError;
use thiserror::Error;

/// Execution result type
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Library execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// No operation with this name is offered
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A required operation parameter is absent
    #[error("Missing required parameter '{parameter}' for operation '{operation}'")]
    MissingParameter { operation: String, parameter: String },

    /// An operation parameter has the wrong shape
    #[error("Invalid parameter '{parameter}' for operation '{operation}': {reason}")]
    InvalidParameter {
        operation: String,
        parameter: String,
        reason: String,
    },

    /// The worker executable is not configured or not a file
    #[error("Runner executable not found at path '{0}'")]
    RunnerNotFound(String),

    /// The worker executable path has no containing directory
    #[error("Invalid runner path '{0}'")]
    InvalidRunnerPath(String),

    /// The worker process could not be started
    #[error("Failed to start runner '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker exited unsuccessfully and failures are enforced
    #[error("Runner exited unsuccessfully (exit code {})", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    WorkerFailed { exit_code: Option<i32> },

    /// The channel did not reach the listening state before launch
    #[error("Channel '{channel}' is not ready: expected Listening, found {state}")]
    ChannelNotReady { channel: String, state: ChannelState },

    /// Transport resolution failed
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Channel lifecycle call failed
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
